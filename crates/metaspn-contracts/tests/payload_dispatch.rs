//! payload_dispatch.rs
//!
//! End-to-end payload flows:
//! - a chain-shaped season payload carried inside a signal envelope is
//!   normalized (camelCase aliases, epoch timestamps) and validated
//! - validation accumulates every violation instead of stopping early
//! - unknown payload types and undecodable payloads fold into verdicts
//! - legacy state-machine payloads decode identically to canonical ones

use serde_json::json;
use time::macros::datetime;

use metaspn_contracts::season1;
use metaspn_core::prelude::*;
use metaspn_contracts::{
    parse_season1_payload, parse_state_machine_config, validate_season1_payload,
    validate_state_machine_payload, Season1Payload, SignalEnvelope,
};

#[test]
fn chain_payload_normalizes_through_an_envelope() {
    let envelope = SignalEnvelope::new(
        "s_10",
        datetime!(2026-02-06 12:00:00 UTC),
        "chain_indexer",
        "SeasonAccountView",
        json!({
            "seasonId": 3,
            "authorityPubkey": "auth_1",
            "towelMint": "mint_1",
            "active": true,
            "startTs": 1_762_502_400i64,
            "rewardPoolTotal": 1_000_000,
            "rewardPoolRemaining": 750_000
        }),
    );

    let parsed = parse_season1_payload(&envelope.payload_type, &envelope.payload).unwrap();
    assert_eq!(parsed.payload_type(), "SeasonAccountView");

    let Season1Payload::SeasonAccount(view) = &parsed else {
        panic!("expected a season account view");
    };
    assert_eq!(view.season_id, 3);
    assert_eq!(view.started_at, datetime!(2025-11-07 08:00:00 UTC));
    assert_eq!(view.reward_pool_remaining, 750_000);

    assert!(parsed.validate().is_valid);

    // The canonical encoding no longer carries chain-side names.
    let tree = parsed.to_tree(false);
    let keys: Vec<&str> = tree.as_object().unwrap().keys().map(|k| k.as_str()).collect();
    assert!(keys.contains(&"season_id"));
    assert!(!keys.contains(&"seasonId"));
    assert_eq!(tree["started_at"], json!("2025-11-07T08:00:00Z"));
}

#[test]
fn reward_claim_violations_all_surface() {
    let verdict = validate_season1_payload(
        "RewardClaim",
        &json!({
            "claimId": "",
            "owner": "",
            "seasonId": -1,
            "claimedAt": "2026-02-06T12:00:00Z",
            "amount": -10,
            "status": "maybe"
        }),
    );
    assert!(!verdict.is_valid);
    assert_eq!(
        verdict.reasons,
        vec![
            "claim_id must be non-empty",
            "owner must be non-empty",
            "season_id must be > 0",
            "amount must be >= 0",
            "status must be one of: claimed,rejected,pending",
        ]
    );
}

#[test]
fn undecodable_payload_is_a_verdict_not_an_error() {
    let verdict = validate_season1_payload("RewardClaim", &json!({"claimId": "c_1"}));
    assert!(!verdict.is_valid);
    assert_eq!(verdict.reasons.len(), 1);
    assert!(verdict.reasons[0].starts_with("parse_error:"));
}

#[test]
fn unknown_payload_type_reports_the_name() {
    let verdict = validate_season1_payload("SeasonAccountVieww", &json!({}));
    assert_eq!(verdict.reasons, vec!["unknown_payload_type: SeasonAccountVieww"]);
}

#[test]
fn typed_validator_agrees_with_dispatch() {
    let payload = json!({
        "seasonId": 1,
        "gameId": 2,
        "attentionScoreBps": 12_000,
        "updatedAt": "2026-02-06T12:00:00Z"
    });
    let by_name = validate_season1_payload("AttentionScoreUpdate", &payload);
    let update = season1::parse_attention_score_update(&payload).unwrap();
    let typed = season1::validate_attention_score_update(&update);
    assert_eq!(by_name, typed);
    assert_eq!(typed.reasons, vec!["attention_score_bps must be between 0 and 10000"]);
}

#[test]
fn legacy_state_machine_payload_matches_canonical() {
    let legacy = parse_state_machine_config(&json!({
        "machine_id": "sm_42",
        "machine_name": "claims",
        "start_state": "open",
        "state_nodes": ["open", "settled"],
        "end_states": ["settled"],
        "transitions": [
            {"from": "open", "to": "settled", "event_name": "settle", "guard": "has_funds"}
        ]
    }))
    .unwrap();

    let canonical = parse_state_machine_config(&json!({
        "config_id": "sm_42",
        "machine_type": "claims",
        "initial_state": "open",
        "states": ["open", "settled"],
        "terminal_states": ["settled"],
        "transitions": [
            {"from_state": "open", "to_state": "settled", "event": "settle", "guard": "has_funds"}
        ]
    }))
    .unwrap();

    assert_eq!(legacy, canonical);
    assert_eq!(legacy.to_tree(false), canonical.to_tree(false));
    assert!(validate_state_machine_payload(&legacy.to_tree(false)).is_valid);
}

#[test]
fn duplicate_edges_detected_regardless_of_guard() {
    let verdict = validate_state_machine_payload(&json!({
        "config_id": "sm_dup",
        "machine_type": "claims",
        "initial_state": "open",
        "states": ["open", "settled"],
        "transitions": [
            {"from_state": "open", "to_state": "settled", "event": "settle"},
            {"from_state": "open", "to_state": "settled", "event": "settle", "guard": "extra"}
        ]
    }));
    assert_eq!(
        verdict.reasons,
        vec!["duplicate transition rule: open|settle|settled"]
    );
}
