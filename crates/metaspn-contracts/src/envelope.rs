//! Core envelopes and causal metadata.
//!
//! Two envelope kinds wrap every payload crossing the pipeline boundary:
//! inbound [`SignalEnvelope`] and outbound [`EmissionEnvelope`]. Both carry a
//! `payload_type` discriminator for caller-side dispatch; the engine itself
//! does not enforce it against the payload's shape.

use std::collections::BTreeMap;

use serde_json::Value;
use time::OffsetDateTime;

use metaspn_core::prelude::*;

/// Identifies the schema package and version an artifact was produced with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaVersionInfo {
    pub package: String,
    pub version: String,
}

static SCHEMA_VERSION_INFO_SHAPE: RecordShape = RecordShape {
    name: "SchemaVersionInfo",
    fields: &[
        FieldSpec::defaulted("package", Kind::Str, FieldDefault::Str(PACKAGE_NAME)),
        FieldSpec::defaulted("version", Kind::Str, FieldDefault::SchemaVersion),
    ],
};

impl Default for SchemaVersionInfo {
    fn default() -> Self {
        Self {
            package: PACKAGE_NAME.to_string(),
            version: DEFAULT_SCHEMA_VERSION.to_string(),
        }
    }
}

impl SchemaRecord for SchemaVersionInfo {
    const SHAPE: &'static RecordShape = &SCHEMA_VERSION_INFO_SHAPE;

    fn to_tree(&self, privacy_mode: bool) -> Value {
        let mut b = TreeBuilder::new(Self::SHAPE, privacy_mode);
        b.str("package", &self.package);
        b.str("version", &self.version);
        b.finish()
    }

    fn from_tree(tree: &Value) -> SchemaResult<Self> {
        let f = FieldValues::decode(tree, Self::SHAPE)?;
        Ok(Self {
            package: f.str("package")?,
            version: f.str("version")?,
        })
    }
}

/// A reference to an external entity (account, handle, token, …).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub ref_type: String,
    pub value: String,
    pub platform: Option<String>,
    pub label: Option<String>,
    pub schema_version: String,
}

static ENTITY_REF_SHAPE: RecordShape = RecordShape {
    name: "EntityRef",
    fields: &[
        FieldSpec::required("ref_type", Kind::Str),
        FieldSpec::required("value", Kind::Str),
        FieldSpec::optional("platform", Kind::Str),
        FieldSpec::optional("label", Kind::Str),
        FieldSpec::schema_version(),
    ],
};

impl EntityRef {
    pub fn new(ref_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            ref_type: ref_type.into(),
            value: value.into(),
            platform: None,
            label: None,
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl SchemaRecord for EntityRef {
    const SHAPE: &'static RecordShape = &ENTITY_REF_SHAPE;

    fn to_tree(&self, privacy_mode: bool) -> Value {
        let mut b = TreeBuilder::new(Self::SHAPE, privacy_mode);
        b.str("ref_type", &self.ref_type);
        b.str("value", &self.value);
        b.opt_str("platform", &self.platform);
        b.opt_str("label", &self.label);
        b.str("schema_version", &self.schema_version);
        b.finish()
    }

    fn from_tree(tree: &Value) -> SchemaResult<Self> {
        let f = FieldValues::decode(tree, Self::SHAPE)?;
        Ok(Self {
            ref_type: f.str("ref_type")?,
            value: f.str("value")?,
            platform: f.opt_str("platform")?,
            label: f.opt_str("label")?,
            schema_version: f.str("schema_version")?,
        })
    }
}

/// Causal/trace metadata attached to envelopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    pub trace_id: String,
    pub caused_by: Vec<String>,
    pub provenance: Option<String>,
    pub redactions: Vec<String>,
    pub metadata: BTreeMap<String, String>,
    pub privacy_mode: bool,
    pub schema_version: String,
}

static TRACE_CONTEXT_SHAPE: RecordShape = RecordShape {
    name: "TraceContext",
    fields: &[
        FieldSpec::required("trace_id", Kind::Str),
        FieldSpec::defaulted("caused_by", Kind::Seq(&Kind::Str), FieldDefault::EmptySeq),
        FieldSpec::optional("provenance", Kind::Str),
        FieldSpec::defaulted("redactions", Kind::Seq(&Kind::Str), FieldDefault::EmptySeq),
        FieldSpec::defaulted("metadata", Kind::Map(&Kind::Str), FieldDefault::EmptyMap),
        FieldSpec::defaulted("privacy_mode", Kind::Bool, FieldDefault::Bool(false)),
        FieldSpec::schema_version(),
    ],
};

impl TraceContext {
    pub fn new(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            caused_by: Vec::new(),
            provenance: None,
            redactions: Vec::new(),
            metadata: BTreeMap::new(),
            privacy_mode: false,
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
        }
    }

    pub fn with_caused_by(mut self, caused_by: Vec<String>) -> Self {
        self.caused_by = caused_by;
        self
    }

    pub fn with_privacy_mode(mut self, privacy_mode: bool) -> Self {
        self.privacy_mode = privacy_mode;
        self
    }
}

impl SchemaRecord for TraceContext {
    const SHAPE: &'static RecordShape = &TRACE_CONTEXT_SHAPE;

    fn to_tree(&self, privacy_mode: bool) -> Value {
        let mut b = TreeBuilder::new(Self::SHAPE, privacy_mode);
        b.str("trace_id", &self.trace_id);
        b.str_seq("caused_by", &self.caused_by);
        b.opt_str("provenance", &self.provenance);
        b.str_seq("redactions", &self.redactions);
        b.str_map("metadata", &self.metadata);
        b.bool("privacy_mode", self.privacy_mode);
        b.str("schema_version", &self.schema_version);
        b.finish()
    }

    fn from_tree(tree: &Value) -> SchemaResult<Self> {
        let f = FieldValues::decode(tree, Self::SHAPE)?;
        Ok(Self {
            trace_id: f.str("trace_id")?,
            caused_by: f.str_seq("caused_by")?,
            provenance: f.opt_str("provenance")?,
            redactions: f.str_seq("redactions")?,
            metadata: f.str_map("metadata")?,
            privacy_mode: f.bool("privacy_mode")?,
            schema_version: f.str("schema_version")?,
        })
    }
}

static ENTITY_REF_KIND: Kind = Kind::Record(&ENTITY_REF_SHAPE);
static TRACE_CONTEXT_KIND: Kind = Kind::Record(&TRACE_CONTEXT_SHAPE);

/// Inbound envelope: an observed signal plus causal metadata.
///
/// The `raw` capture is privacy-flagged: it is dropped entirely from
/// privacy-mode output.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalEnvelope {
    pub signal_id: String,
    pub timestamp: OffsetDateTime,
    pub source: String,
    pub payload_type: String,
    pub payload: Value,
    pub schema_version: String,
    pub entity_refs: Vec<EntityRef>,
    pub trace: Option<TraceContext>,
    pub raw: Option<Value>,
}

static SIGNAL_ENVELOPE_SHAPE: RecordShape = RecordShape {
    name: "SignalEnvelope",
    fields: &[
        FieldSpec::required("signal_id", Kind::Str),
        FieldSpec::required("timestamp", Kind::Timestamp),
        FieldSpec::required("source", Kind::Str),
        FieldSpec::required("payload_type", Kind::Str),
        FieldSpec::required("payload", Kind::Any),
        FieldSpec::schema_version(),
        FieldSpec::defaulted("entity_refs", Kind::Seq(&ENTITY_REF_KIND), FieldDefault::EmptySeq),
        FieldSpec::defaulted("trace", Kind::Option(&TRACE_CONTEXT_KIND), FieldDefault::Null),
        FieldSpec::defaulted("raw", Kind::Any, FieldDefault::Null).privacy(),
    ],
};

impl SignalEnvelope {
    /// Construct an inbound envelope; the timestamp is normalized to UTC.
    pub fn new(
        signal_id: impl Into<String>,
        timestamp: OffsetDateTime,
        source: impl Into<String>,
        payload_type: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            signal_id: signal_id.into(),
            timestamp: ensure_utc(timestamp),
            source: source.into(),
            payload_type: payload_type.into(),
            payload,
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
            entity_refs: Vec::new(),
            trace: None,
            raw: None,
        }
    }

    pub fn with_entity_refs(mut self, entity_refs: Vec<EntityRef>) -> Self {
        self.entity_refs = entity_refs;
        self
    }

    pub fn with_trace(mut self, trace: TraceContext) -> Self {
        self.trace = Some(trace);
        self
    }

    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = Some(raw);
        self
    }
}

impl SchemaRecord for SignalEnvelope {
    const SHAPE: &'static RecordShape = &SIGNAL_ENVELOPE_SHAPE;

    fn to_tree(&self, privacy_mode: bool) -> Value {
        let mut b = TreeBuilder::new(Self::SHAPE, privacy_mode);
        b.str("signal_id", &self.signal_id);
        b.timestamp("timestamp", self.timestamp);
        b.str("source", &self.source);
        b.str("payload_type", &self.payload_type);
        b.any("payload", &self.payload);
        b.str("schema_version", &self.schema_version);
        b.record_seq("entity_refs", &self.entity_refs);
        b.opt_record("trace", &self.trace);
        b.opt_any("raw", &self.raw);
        b.finish()
    }

    fn from_tree(tree: &Value) -> SchemaResult<Self> {
        let f = FieldValues::decode(tree, Self::SHAPE)?;
        Ok(Self {
            signal_id: f.str("signal_id")?,
            timestamp: f.timestamp("timestamp")?,
            source: f.str("source")?,
            payload_type: f.str("payload_type")?,
            payload: f.any("payload")?,
            schema_version: f.str("schema_version")?,
            entity_refs: f.record_seq("entity_refs")?,
            trace: f.opt_record("trace")?,
            raw: f.opt_any("raw")?,
        })
    }
}

/// Outbound envelope: an emission caused by a prior signal or decision.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionEnvelope {
    pub emission_id: String,
    pub timestamp: OffsetDateTime,
    pub emission_type: String,
    pub payload: Value,
    pub caused_by: String,
    pub schema_version: String,
    pub trace: Option<TraceContext>,
    pub entity_refs: Vec<EntityRef>,
}

static EMISSION_ENVELOPE_SHAPE: RecordShape = RecordShape {
    name: "EmissionEnvelope",
    fields: &[
        FieldSpec::required("emission_id", Kind::Str),
        FieldSpec::required("timestamp", Kind::Timestamp),
        FieldSpec::required("emission_type", Kind::Str),
        FieldSpec::required("payload", Kind::Any),
        FieldSpec::required("caused_by", Kind::Str),
        FieldSpec::schema_version(),
        FieldSpec::defaulted("trace", Kind::Option(&TRACE_CONTEXT_KIND), FieldDefault::Null),
        FieldSpec::defaulted("entity_refs", Kind::Seq(&ENTITY_REF_KIND), FieldDefault::EmptySeq),
    ],
};

impl EmissionEnvelope {
    /// Construct an outbound envelope; the timestamp is normalized to UTC.
    pub fn new(
        emission_id: impl Into<String>,
        timestamp: OffsetDateTime,
        emission_type: impl Into<String>,
        payload: Value,
        caused_by: impl Into<String>,
    ) -> Self {
        Self {
            emission_id: emission_id.into(),
            timestamp: ensure_utc(timestamp),
            emission_type: emission_type.into(),
            payload,
            caused_by: caused_by.into(),
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
            trace: None,
            entity_refs: Vec::new(),
        }
    }

    pub fn with_trace(mut self, trace: TraceContext) -> Self {
        self.trace = Some(trace);
        self
    }

    pub fn with_entity_refs(mut self, entity_refs: Vec<EntityRef>) -> Self {
        self.entity_refs = entity_refs;
        self
    }
}

impl SchemaRecord for EmissionEnvelope {
    const SHAPE: &'static RecordShape = &EMISSION_ENVELOPE_SHAPE;

    fn to_tree(&self, privacy_mode: bool) -> Value {
        let mut b = TreeBuilder::new(Self::SHAPE, privacy_mode);
        b.str("emission_id", &self.emission_id);
        b.timestamp("timestamp", self.timestamp);
        b.str("emission_type", &self.emission_type);
        b.any("payload", &self.payload);
        b.str("caused_by", &self.caused_by);
        b.str("schema_version", &self.schema_version);
        b.opt_record("trace", &self.trace);
        b.record_seq("entity_refs", &self.entity_refs);
        b.finish()
    }

    fn from_tree(tree: &Value) -> SchemaResult<Self> {
        let f = FieldValues::decode(tree, Self::SHAPE)?;
        Ok(Self {
            emission_id: f.str("emission_id")?,
            timestamp: f.timestamp("timestamp")?,
            emission_type: f.str("emission_type")?,
            payload: f.any("payload")?,
            caused_by: f.str("caused_by")?,
            schema_version: f.str("schema_version")?,
            trace: f.opt_record("trace")?,
            entity_refs: f.record_seq("entity_refs")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn signal() -> SignalEnvelope {
        SignalEnvelope::new(
            "s_1",
            datetime!(2026-02-06 08:00:00 -08:00),
            "x",
            "SocialPostSeen",
            json!({"post_id": "p1"}),
        )
        .with_entity_refs(vec![EntityRef::new("handle", "@a").with_platform("x")])
        .with_trace(TraceContext::new("tr_1").with_caused_by(vec!["s_0".into()]))
        .with_raw(json!({"api": {"z": 1, "a": 2}}))
    }

    #[test]
    fn constructor_normalizes_timestamp_to_utc() {
        let s = signal();
        assert_eq!(s.timestamp, datetime!(2026-02-06 16:00:00 UTC));
        assert_eq!(s.to_tree(false)["timestamp"], json!("2026-02-06T16:00:00Z"));
    }

    #[test]
    fn signal_round_trips() {
        let s = signal();
        assert_eq!(SignalEnvelope::from_tree(&s.to_tree(false)).unwrap(), s);
    }

    #[test]
    fn privacy_mode_omits_raw() {
        let tree = signal().to_tree(true);
        assert!(!tree.as_object().unwrap().contains_key("raw"));
    }

    #[test]
    fn emission_round_trips() {
        let e = EmissionEnvelope::new(
            "e_1",
            datetime!(2026-02-06 12:00:00 UTC),
            "draft_message",
            json!({"body": "hello"}),
            "s_1",
        );
        assert_eq!(EmissionEnvelope::from_tree(&e.to_tree(false)).unwrap(), e);
    }

    #[test]
    fn version_info_defaults() {
        let info = SchemaVersionInfo::from_tree(&json!({})).unwrap();
        assert_eq!(info, SchemaVersionInfo::default());
        assert_eq!(info.package, PACKAGE_NAME);
    }
}
