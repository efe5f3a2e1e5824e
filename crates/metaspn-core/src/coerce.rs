//! Type-directed coercion between raw key/value trees and canonical field
//! values.
//!
//! [`decode_fields`] walks a record's declared [`RecordShape`] against an
//! input tree and produces a canonical field map:
//! - absent fields take their declared default (constructed fresh per call)
//!   or fail with `MissingField` before any coercion is attempted
//! - present values are coerced recursively per [`Kind`]
//! - timestamps are re-rendered in the canonical UTC string form
//! - set-like sequences are sorted ascending
//! - mapping keys end up sorted at every depth (the map representation is
//!   ordered by construction)
//!
//! The engine holds no state: concurrent callers never coordinate.

use serde_json::{Map, Value};

use crate::descriptor::{FieldDefault, Kind, RecordShape};
use crate::errors::{SchemaError, SchemaResult};
use crate::timestamp;
use crate::DEFAULT_SCHEMA_VERSION;

/// Decode an input tree against a record shape, producing the canonical
/// per-field values keyed by field name.
pub fn decode_fields(tree: &Value, shape: &RecordShape) -> SchemaResult<Map<String, Value>> {
    let obj = tree.as_object().ok_or_else(|| {
        SchemaError::invalid_argument(format!("{} payload must be a mapping", shape.name))
    })?;

    let mut out = Map::new();
    for spec in shape.fields {
        let value = match obj.get(spec.name) {
            Some(raw) => coerce(&spec.kind, raw, spec.name)?,
            None => default_value(&spec.default)
                .ok_or_else(|| SchemaError::missing_field(spec.name))?,
        };
        out.insert(spec.name.to_string(), value);
    }
    Ok(out)
}

/// Materialize a field default. Returns `None` for `Required`.
///
/// Collection defaults are constructed fresh on every call; no default value
/// is ever shared between decodes.
pub fn default_value(default: &FieldDefault) -> Option<Value> {
    match default {
        FieldDefault::Required => None,
        FieldDefault::Null => Some(Value::Null),
        FieldDefault::Str(s) => Some(Value::String((*s).to_string())),
        FieldDefault::Int(i) => Some(Value::from(*i)),
        FieldDefault::Bool(b) => Some(Value::Bool(*b)),
        FieldDefault::SchemaVersion => Some(Value::String(DEFAULT_SCHEMA_VERSION.to_string())),
        FieldDefault::EmptySeq => Some(Value::Array(Vec::new())),
        FieldDefault::EmptyMap => Some(Value::Object(Map::new())),
    }
}

/// Coerce one raw value to the declared kind, recursively.
pub fn coerce(kind: &Kind, value: &Value, field: &str) -> SchemaResult<Value> {
    match kind {
        Kind::Str => coerce_str(value, field),
        Kind::Int => coerce_int(value, field),
        Kind::Float => coerce_float(value, field),
        Kind::Bool => coerce_bool(value, field),
        Kind::Timestamp => coerce_timestamp(value, field),
        Kind::Any => Ok(value.clone()),
        Kind::Option(inner) => match value {
            Value::Null => Ok(Value::Null),
            other => coerce(inner, other, field),
        },
        Kind::Union(alternatives) => coerce_union(alternatives, value, field),
        Kind::Seq(inner) => coerce_seq(inner, value, field, false),
        Kind::SortedSeq(inner) => coerce_seq(inner, value, field, true),
        Kind::Map(inner) => coerce_map(inner, value, field),
        Kind::Record(shape) => match value {
            Value::Object(_) => Ok(Value::Object(decode_fields(value, shape)?)),
            other => Err(SchemaError::coercion(
                field,
                shape.name,
                format!("found {}", kind_of(other)),
            )),
        },
    }
}

fn coerce_str(value: &Value, field: &str) -> SchemaResult<Value> {
    match value {
        Value::String(_) => Ok(value.clone()),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        other => Err(SchemaError::coercion(
            field,
            "string",
            format!("found {}", kind_of(other)),
        )),
    }
}

fn coerce_int(value: &Value, field: &str) -> SchemaResult<Value> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(Value::from(i));
            }
            if let Some(f) = n.as_f64() {
                // Fractional input truncates toward zero.
                return Ok(Value::from(f as i64));
            }
            Err(SchemaError::coercion(
                field,
                "integer",
                "number out of i64 range",
            ))
        }
        Value::String(s) => s
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| SchemaError::coercion(field, "integer", format!("cannot parse '{s}'"))),
        other => Err(SchemaError::coercion(
            field,
            "integer",
            format!("found {}", kind_of(other)),
        )),
    }
}

fn coerce_float(value: &Value, field: &str) -> SchemaResult<Value> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(Value::from)
            .ok_or_else(|| SchemaError::coercion(field, "float", "number out of f64 range")),
        Value::String(s) => s
            .parse::<f64>()
            .map(Value::from)
            .map_err(|_| SchemaError::coercion(field, "float", format!("cannot parse '{s}'"))),
        other => Err(SchemaError::coercion(
            field,
            "float",
            format!("found {}", kind_of(other)),
        )),
    }
}

fn coerce_bool(value: &Value, field: &str) -> SchemaResult<Value> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::String(s) => s
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|_| SchemaError::coercion(field, "boolean", format!("cannot parse '{s}'"))),
        other => Err(SchemaError::coercion(
            field,
            "boolean",
            format!("found {}", kind_of(other)),
        )),
    }
}

fn coerce_timestamp(value: &Value, field: &str) -> SchemaResult<Value> {
    match value {
        Value::String(s) => {
            let parsed = timestamp::parse_utc(s)
                .map_err(|e| SchemaError::coercion(field, "timestamp", e.to_string()))?;
            Ok(Value::String(timestamp::format_utc(parsed)))
        }
        other => Err(SchemaError::coercion(
            field,
            "timestamp",
            format!("found {}", kind_of(other)),
        )),
    }
}

fn coerce_union(alternatives: &[Kind], value: &Value, field: &str) -> SchemaResult<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    let mut last_error = None;
    for alternative in alternatives {
        match coerce(alternative, value, field) {
            Ok(v) => return Ok(v),
            Err(e) => last_error = Some(e),
        }
    }
    match last_error {
        // Documented arbitrary tie-break: the last alternative's failure wins.
        Some(e) => Err(e),
        None => Ok(value.clone()),
    }
}

fn coerce_seq(inner: &Kind, value: &Value, field: &str, sorted: bool) -> SchemaResult<Value> {
    let items = value.as_array().ok_or_else(|| {
        SchemaError::coercion(field, "sequence", format!("found {}", kind_of(value)))
    })?;

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(coerce(inner, item, field)?);
    }
    if sorted {
        // Construction-time invariant, not an encode-time cosmetic.
        out.sort_by(|a, b| match (a.as_str(), b.as_str()) {
            (Some(a), Some(b)) => a.cmp(b),
            _ => a.to_string().cmp(&b.to_string()),
        });
    }
    Ok(Value::Array(out))
}

fn coerce_map(inner: &Kind, value: &Value, field: &str) -> SchemaResult<Value> {
    let entries = value.as_object().ok_or_else(|| {
        SchemaError::coercion(field, "mapping", format!("found {}", kind_of(value)))
    })?;

    let mut out = Map::new();
    for (key, item) in entries {
        out.insert(key.clone(), coerce(inner, item, field)?);
    }
    Ok(Value::Object(out))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldSpec;
    use assert_matches::assert_matches;
    use serde_json::json;

    static INNER: RecordShape = RecordShape {
        name: "Inner",
        fields: &[
            FieldSpec::required("value", Kind::Str),
            FieldSpec::schema_version(),
        ],
    };

    static INNER_KIND: Kind = Kind::Record(&INNER);

    static SHAPE: RecordShape = RecordShape {
        name: "Outer",
        fields: &[
            FieldSpec::required("id", Kind::Str),
            FieldSpec::required("count", Kind::Int),
            FieldSpec::defaulted("topics", Kind::SortedSeq(&Kind::Str), FieldDefault::EmptySeq),
            FieldSpec::defaulted("scores", Kind::Map(&Kind::Float), FieldDefault::EmptyMap),
            FieldSpec::optional("seen_at", Kind::Timestamp),
            FieldSpec::defaulted("nested", Kind::Option(&INNER_KIND), FieldDefault::Null),
            FieldSpec::schema_version(),
        ],
    };

    #[test]
    fn missing_required_field_fails_first() {
        let err = decode_fields(&json!({"count": 1}), &SHAPE).unwrap_err();
        assert_matches!(err, SchemaError::MissingField { field } if field == "id");
    }

    #[test]
    fn defaults_are_fresh_per_call() {
        let a = decode_fields(&json!({"id": "a", "count": 1}), &SHAPE).unwrap();
        let b = decode_fields(&json!({"id": "b", "count": 2}), &SHAPE).unwrap();
        assert_eq!(a["topics"], json!([]));
        assert_eq!(b["topics"], json!([]));
        assert_eq!(a["schema_version"], json!(DEFAULT_SCHEMA_VERSION));
        assert_eq!(b["scores"], json!({}));
    }

    #[test]
    fn sorted_seq_sorts_on_decode() {
        let f = decode_fields(
            &json!({"id": "a", "count": 1, "topics": ["ml", "ai", "defi"]}),
            &SHAPE,
        )
        .unwrap();
        assert_eq!(f["topics"], json!(["ai", "defi", "ml"]));
    }

    #[test]
    fn timestamps_rerender_canonically() {
        let f = decode_fields(
            &json!({"id": "a", "count": 1, "seen_at": "2026-02-06T08:00:00-08:00"}),
            &SHAPE,
        )
        .unwrap();
        assert_eq!(f["seen_at"], json!("2026-02-06T16:00:00Z"));
    }

    #[test]
    fn nested_record_recurses() {
        let f = decode_fields(
            &json!({"id": "a", "count": 1, "nested": {"value": "x"}}),
            &SHAPE,
        )
        .unwrap();
        assert_eq!(f["nested"]["value"], json!("x"));
        assert_eq!(f["nested"]["schema_version"], json!(DEFAULT_SCHEMA_VERSION));
    }

    #[test]
    fn absent_optional_record_defaults_to_null() {
        let f = decode_fields(&json!({"id": "a", "count": 1}), &SHAPE).unwrap();
        assert_eq!(f["nested"], json!(null));
    }

    #[test]
    fn numeric_strings_coerce() {
        let f = decode_fields(&json!({"id": "a", "count": "41"}), &SHAPE).unwrap();
        assert_eq!(f["count"], json!(41));
        assert_matches!(
            coerce(&Kind::Float, &json!("2.5"), "x").unwrap(),
            Value::Number(_)
        );
    }

    #[test]
    fn invalid_coercion_surfaces_field_name() {
        let err = decode_fields(&json!({"id": "a", "count": [1]}), &SHAPE).unwrap_err();
        assert_matches!(err, SchemaError::Coercion { field, .. } if field == "count");
    }

    #[test]
    fn null_for_required_kind_is_a_coercion_failure() {
        let err = decode_fields(&json!({"id": null, "count": 1}), &SHAPE).unwrap_err();
        assert_matches!(err, SchemaError::Coercion { .. });
    }

    #[test]
    fn union_surfaces_last_alternative_failure() {
        static ALTS: [Kind; 2] = [Kind::Int, Kind::Bool];
        let err = coerce(&Kind::Union(&ALTS), &json!([]), "mixed").unwrap_err();
        assert_matches!(err, SchemaError::Coercion { expected, .. } if expected == "boolean");

        let ok = coerce(&Kind::Union(&ALTS), &json!(7), "mixed").unwrap();
        assert_eq!(ok, json!(7));
    }

    #[test]
    fn union_null_resolves_to_absent() {
        static ALTS: [Kind; 2] = [Kind::Int, Kind::Bool];
        assert_eq!(coerce(&Kind::Union(&ALTS), &json!(null), "x").unwrap(), json!(null));
    }

    #[test]
    fn map_input_key_order_is_irrelevant() {
        let a = decode_fields(
            &json!({"id": "a", "count": 1, "scores": {"z": 1.0, "a": 2.0}}),
            &SHAPE,
        )
        .unwrap();
        let keys: Vec<&str> = a["scores"].as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["a", "z"]);
    }
}
