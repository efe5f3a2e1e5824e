//! envelope_roundtrip.rs
//!
//! Black-box canonicalization tests over full envelopes:
//! - encode/decode round-trip with nested trace and entity refs
//! - mapping keys sorted at every depth of the serialized form
//! - repeated encoding is byte-for-byte identical
//! - privacy mode drops flagged fields, including through nesting

use serde_json::json;
use time::macros::datetime;

use metaspn_contracts::{EntityRef, SignalEnvelope, TraceContext};
use metaspn_core::prelude::*;

fn envelope() -> SignalEnvelope {
    SignalEnvelope::new(
        "s_01",
        datetime!(2026-02-06 04:30:00 -08:00),
        "x_firehose",
        "SocialPostSeen",
        json!({
            "post_id": "p_9",
            "platform": "x",
            "author_handle": "@zed",
            "content": "gm",
            "seen_at": "2026-02-06T12:30:00Z"
        }),
    )
    .with_entity_refs(vec![
        EntityRef::new("handle", "@zed").with_platform("x"),
        EntityRef::new("token", "mint_1").with_label("towel"),
    ])
    .with_trace(TraceContext::new("tr_7").with_caused_by(vec!["s_00".into()]))
    .with_raw(json!({"zeta": 1, "alpha": {"y": 2, "b": 3}}))
}

#[test]
fn round_trip_preserves_the_record() {
    let original = envelope();
    let decoded = SignalEnvelope::from_tree(&original.to_tree(false)).unwrap();
    assert_eq!(decoded, original);
}

#[test]
fn timestamps_normalize_to_utc_on_construction() {
    let tree = envelope().to_tree(false);
    assert_eq!(tree["timestamp"], json!("2026-02-06T12:30:00Z"));
}

#[test]
fn serialized_form_is_sorted_at_every_depth() {
    let rendered = serde_json::to_string(&envelope().to_tree(false)).unwrap();

    // Top level: entity_refs < payload < raw < signal_id.
    let entity_refs = rendered.find("\"entity_refs\"").unwrap();
    let payload = rendered.find("\"payload\"").unwrap();
    let raw = rendered.find("\"raw\"").unwrap();
    let signal_id = rendered.find("\"signal_id\"").unwrap();
    assert!(entity_refs < payload && payload < raw && raw < signal_id);

    // Free-form payload and raw objects are sorted too.
    assert!(rendered.find("\"alpha\"").unwrap() < rendered.find("\"zeta\"").unwrap());
    assert!(rendered.find("\"b\":3").unwrap() < rendered.find("\"y\":2").unwrap());
}

#[test]
fn repeated_encoding_is_deterministic() {
    let e = envelope();
    let a = serde_json::to_string(&e.to_tree(false)).unwrap();
    let b = serde_json::to_string(&e.to_tree(false)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn privacy_mode_drops_raw_but_keeps_everything_else() {
    let plain = envelope().to_tree(false);
    let private = envelope().to_tree(true);

    assert!(plain.as_object().unwrap().contains_key("raw"));
    assert!(!private.as_object().unwrap().contains_key("raw"));
    assert_eq!(plain["payload"], private["payload"]);
    assert_eq!(plain["entity_refs"], private["entity_refs"]);
}

#[test]
fn decoding_fills_envelope_defaults() {
    let decoded = SignalEnvelope::from_tree(&json!({
        "signal_id": "s_02",
        "timestamp": "2026-02-06T12:00:00Z",
        "source": "manual",
        "payload_type": "Freeform",
        "payload": {"note": "anything"}
    }))
    .unwrap();
    assert_eq!(decoded.schema_version, DEFAULT_SCHEMA_VERSION);
    assert!(decoded.entity_refs.is_empty());
    assert_eq!(decoded.trace, None);
    assert_eq!(decoded.raw, None);
}
