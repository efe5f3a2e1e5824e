//! The record contract: every schema record converts to a canonical
//! key/value tree and reconstructs from one.
//!
//! Records are immutable value types. Canonicalization happens on the way
//! in (decode coerces, sorts set-like sequences, normalizes timestamps) and
//! on the way out (encode renders timestamps as canonical UTC strings, emits
//! sorted mapping keys at every depth, and drops privacy-flagged fields
//! entirely when privacy mode is on).
//!
//! Round-trip law: `T::from_tree(&r.to_tree(false)) == r` for every valid
//! record `r`.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::coerce::decode_fields;
use crate::descriptor::RecordShape;
use crate::errors::{SchemaError, SchemaResult};
use crate::timestamp;

/// The capability every schema record implements.
pub trait SchemaRecord: Sized {
    /// The static wire shape of this record type.
    const SHAPE: &'static RecordShape;

    /// Encode to a canonical key/value tree.
    fn to_tree(&self, privacy_mode: bool) -> Value;

    /// Reconstruct from a key/value tree.
    fn from_tree(tree: &Value) -> SchemaResult<Self>;
}

/// Canonical per-field values produced by a decode, with typed accessors.
///
/// All accessors operate on already-coerced values, so failures indicate a
/// mismatch between a record's shape table and its `from_tree` body.
pub struct FieldValues {
    shape: &'static RecordShape,
    values: Map<String, Value>,
}

impl FieldValues {
    /// Run the coercion engine over `tree` for `shape`.
    pub fn decode(tree: &Value, shape: &'static RecordShape) -> SchemaResult<Self> {
        Ok(Self {
            shape,
            values: decode_fields(tree, shape)?,
        })
    }

    fn get(&self, name: &str) -> SchemaResult<&Value> {
        self.values.get(name).ok_or_else(|| {
            SchemaError::invalid_argument(format!(
                "{}: field '{name}' is not declared in the shape table",
                self.shape.name
            ))
        })
    }

    pub fn str(&self, name: &str) -> SchemaResult<String> {
        let v = self.get(name)?;
        v.as_str().map(str::to_string).ok_or_else(|| {
            SchemaError::coercion(name, "string", format!("found {v}"))
        })
    }

    pub fn int(&self, name: &str) -> SchemaResult<i64> {
        let v = self.get(name)?;
        v.as_i64()
            .ok_or_else(|| SchemaError::coercion(name, "integer", format!("found {v}")))
    }

    pub fn float(&self, name: &str) -> SchemaResult<f64> {
        let v = self.get(name)?;
        v.as_f64()
            .ok_or_else(|| SchemaError::coercion(name, "float", format!("found {v}")))
    }

    pub fn bool(&self, name: &str) -> SchemaResult<bool> {
        let v = self.get(name)?;
        v.as_bool()
            .ok_or_else(|| SchemaError::coercion(name, "boolean", format!("found {v}")))
    }

    pub fn timestamp(&self, name: &str) -> SchemaResult<OffsetDateTime> {
        timestamp::parse_utc(&self.str(name)?)
    }

    pub fn opt_str(&self, name: &str) -> SchemaResult<Option<String>> {
        match self.get(name)? {
            Value::Null => Ok(None),
            _ => self.str(name).map(Some),
        }
    }

    pub fn opt_int(&self, name: &str) -> SchemaResult<Option<i64>> {
        match self.get(name)? {
            Value::Null => Ok(None),
            _ => self.int(name).map(Some),
        }
    }

    pub fn opt_float(&self, name: &str) -> SchemaResult<Option<f64>> {
        match self.get(name)? {
            Value::Null => Ok(None),
            _ => self.float(name).map(Some),
        }
    }

    pub fn opt_timestamp(&self, name: &str) -> SchemaResult<Option<OffsetDateTime>> {
        match self.get(name)? {
            Value::Null => Ok(None),
            _ => self.timestamp(name).map(Some),
        }
    }

    pub fn str_seq(&self, name: &str) -> SchemaResult<Vec<String>> {
        let v = self.get(name)?;
        let items = v.as_array().ok_or_else(|| {
            SchemaError::coercion(name, "sequence", format!("found {v}"))
        })?;
        items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    SchemaError::coercion(name, "string", format!("found {item}"))
                })
            })
            .collect()
    }

    pub fn str_map(&self, name: &str) -> SchemaResult<BTreeMap<String, String>> {
        let entries = self.object(name)?;
        entries
            .iter()
            .map(|(k, v)| {
                v.as_str().map(|s| (k.clone(), s.to_string())).ok_or_else(|| {
                    SchemaError::coercion(name, "string", format!("found {v}"))
                })
            })
            .collect()
    }

    pub fn float_map(&self, name: &str) -> SchemaResult<BTreeMap<String, f64>> {
        let entries = self.object(name)?;
        entries
            .iter()
            .map(|(k, v)| {
                v.as_f64().map(|f| (k.clone(), f)).ok_or_else(|| {
                    SchemaError::coercion(name, "float", format!("found {v}"))
                })
            })
            .collect()
    }

    /// Unconstrained value, passed through as-is.
    pub fn any(&self, name: &str) -> SchemaResult<Value> {
        self.get(name).cloned()
    }

    /// Unconstrained string-keyed mapping (e.g. task inputs).
    pub fn any_map(&self, name: &str) -> SchemaResult<Map<String, Value>> {
        self.object(name).cloned()
    }

    pub fn opt_any(&self, name: &str) -> SchemaResult<Option<Value>> {
        match self.get(name)? {
            Value::Null => Ok(None),
            other => Ok(Some(other.clone())),
        }
    }

    pub fn record<T: SchemaRecord>(&self, name: &str) -> SchemaResult<T> {
        T::from_tree(self.get(name)?)
    }

    pub fn opt_record<T: SchemaRecord>(&self, name: &str) -> SchemaResult<Option<T>> {
        match self.get(name)? {
            Value::Null => Ok(None),
            other => T::from_tree(other).map(Some),
        }
    }

    pub fn record_seq<T: SchemaRecord>(&self, name: &str) -> SchemaResult<Vec<T>> {
        let v = self.get(name)?;
        let items = v.as_array().ok_or_else(|| {
            SchemaError::coercion(name, "sequence", format!("found {v}"))
        })?;
        items.iter().map(T::from_tree).collect()
    }

    fn object(&self, name: &str) -> SchemaResult<&Map<String, Value>> {
        let v = self.get(name)?;
        v.as_object()
            .ok_or_else(|| SchemaError::coercion(name, "mapping", format!("found {v}")))
    }
}

/// Encode-side builder producing the canonical output tree.
///
/// Mapping keys come out sorted because the underlying object representation
/// is ordered; privacy-flagged fields are dropped (not nulled) when privacy
/// mode is requested; nested records inherit the privacy flag.
pub struct TreeBuilder {
    shape: &'static RecordShape,
    privacy_mode: bool,
    out: Map<String, Value>,
}

impl TreeBuilder {
    pub fn new(shape: &'static RecordShape, privacy_mode: bool) -> Self {
        Self {
            shape,
            privacy_mode,
            out: Map::new(),
        }
    }

    fn put(&mut self, name: &'static str, value: Value) {
        if self.privacy_mode {
            if let Some(spec) = self.shape.field(name) {
                if spec.omit_in_privacy {
                    return;
                }
            }
        }
        self.out.insert(name.to_string(), value);
    }

    pub fn str(&mut self, name: &'static str, value: &str) {
        self.put(name, Value::String(value.to_string()));
    }

    pub fn int(&mut self, name: &'static str, value: i64) {
        self.put(name, Value::from(value));
    }

    pub fn float(&mut self, name: &'static str, value: f64) {
        self.put(name, Value::from(value));
    }

    pub fn bool(&mut self, name: &'static str, value: bool) {
        self.put(name, Value::Bool(value));
    }

    pub fn timestamp(&mut self, name: &'static str, value: OffsetDateTime) {
        self.put(name, Value::String(timestamp::format_utc(value)));
    }

    pub fn opt_str(&mut self, name: &'static str, value: &Option<String>) {
        match value {
            Some(s) => self.str(name, s),
            None => self.put(name, Value::Null),
        }
    }

    pub fn opt_int(&mut self, name: &'static str, value: &Option<i64>) {
        match value {
            Some(i) => self.int(name, *i),
            None => self.put(name, Value::Null),
        }
    }

    pub fn opt_float(&mut self, name: &'static str, value: &Option<f64>) {
        match value {
            Some(f) => self.float(name, *f),
            None => self.put(name, Value::Null),
        }
    }

    pub fn opt_timestamp(&mut self, name: &'static str, value: &Option<OffsetDateTime>) {
        match value {
            Some(t) => self.timestamp(name, *t),
            None => self.put(name, Value::Null),
        }
    }

    pub fn str_seq(&mut self, name: &'static str, values: &[String]) {
        let items = values.iter().map(|s| Value::String(s.clone())).collect();
        self.put(name, Value::Array(items));
    }

    pub fn str_map(&mut self, name: &'static str, values: &BTreeMap<String, String>) {
        let mut out = Map::new();
        for (k, v) in values {
            out.insert(k.clone(), Value::String(v.clone()));
        }
        self.put(name, Value::Object(out));
    }

    pub fn float_map(&mut self, name: &'static str, values: &BTreeMap<String, f64>) {
        let mut out = Map::new();
        for (k, v) in values {
            out.insert(k.clone(), Value::from(*v));
        }
        self.put(name, Value::Object(out));
    }

    pub fn any(&mut self, name: &'static str, value: &Value) {
        self.put(name, value.clone());
    }

    pub fn any_map(&mut self, name: &'static str, values: &Map<String, Value>) {
        self.put(name, Value::Object(values.clone()));
    }

    pub fn opt_any(&mut self, name: &'static str, value: &Option<Value>) {
        match value {
            Some(v) => self.any(name, v),
            None => self.put(name, Value::Null),
        }
    }

    pub fn record<T: SchemaRecord>(&mut self, name: &'static str, value: &T) {
        let tree = value.to_tree(self.privacy_mode);
        self.put(name, tree);
    }

    pub fn opt_record<T: SchemaRecord>(&mut self, name: &'static str, value: &Option<T>) {
        match value {
            Some(r) => self.record(name, r),
            None => self.put(name, Value::Null),
        }
    }

    pub fn record_seq<T: SchemaRecord>(&mut self, name: &'static str, values: &[T]) {
        let privacy = self.privacy_mode;
        let items = values.iter().map(|r| r.to_tree(privacy)).collect();
        self.put(name, Value::Array(items));
    }

    pub fn finish(self) -> Value {
        Value::Object(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldDefault, FieldSpec, Kind};
    use serde_json::json;
    use time::macros::datetime;

    #[derive(Debug, Clone, PartialEq)]
    struct Probe {
        probe_id: String,
        seen_at: OffsetDateTime,
        topics: Vec<String>,
        raw: Option<Value>,
        schema_version: String,
    }

    static PROBE_SHAPE: RecordShape = RecordShape {
        name: "Probe",
        fields: &[
            FieldSpec::required("probe_id", Kind::Str),
            FieldSpec::required("seen_at", Kind::Timestamp),
            FieldSpec::defaulted("topics", Kind::SortedSeq(&Kind::Str), FieldDefault::EmptySeq),
            FieldSpec::optional("raw", Kind::Any).privacy(),
            FieldSpec::schema_version(),
        ],
    };

    impl SchemaRecord for Probe {
        const SHAPE: &'static RecordShape = &PROBE_SHAPE;

        fn to_tree(&self, privacy_mode: bool) -> Value {
            let mut b = TreeBuilder::new(Self::SHAPE, privacy_mode);
            b.str("probe_id", &self.probe_id);
            b.timestamp("seen_at", self.seen_at);
            b.str_seq("topics", &self.topics);
            b.opt_any("raw", &self.raw);
            b.str("schema_version", &self.schema_version);
            b.finish()
        }

        fn from_tree(tree: &Value) -> SchemaResult<Self> {
            let f = FieldValues::decode(tree, Self::SHAPE)?;
            Ok(Self {
                probe_id: f.str("probe_id")?,
                seen_at: f.timestamp("seen_at")?,
                topics: f.str_seq("topics")?,
                raw: f.opt_any("raw")?,
                schema_version: f.str("schema_version")?,
            })
        }
    }

    fn probe() -> Probe {
        Probe {
            probe_id: "p_1".into(),
            seen_at: datetime!(2026-02-06 12:00:00 UTC),
            topics: vec!["ai".into(), "ml".into()],
            raw: Some(json!({"z": 1, "a": 2})),
            schema_version: crate::DEFAULT_SCHEMA_VERSION.into(),
        }
    }

    #[test]
    fn round_trip_law() {
        let p = probe();
        let back = Probe::from_tree(&p.to_tree(false)).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn privacy_mode_drops_flagged_field_entirely() {
        let tree = probe().to_tree(true);
        let obj = tree.as_object().unwrap();
        assert!(!obj.contains_key("raw"));
        assert!(obj.contains_key("probe_id"));
    }

    #[test]
    fn encode_emits_sorted_keys_at_every_depth() {
        let rendered = serde_json::to_string(&probe().to_tree(false)).unwrap();
        // Top-level keys sorted ascending, and the nested "raw" object too.
        assert!(rendered.find("\"probe_id\"").unwrap() < rendered.find("\"raw\"").unwrap());
        assert!(rendered.find("\"a\":2").unwrap() < rendered.find("\"z\":1").unwrap());
    }

    #[test]
    fn decode_fills_defaults() {
        let p = Probe::from_tree(&json!({
            "probe_id": "p_2",
            "seen_at": "2026-02-06T12:00:00Z"
        }))
        .unwrap();
        assert!(p.topics.is_empty());
        assert_eq!(p.raw, None);
        assert_eq!(p.schema_version, crate::DEFAULT_SCHEMA_VERSION);
    }
}
