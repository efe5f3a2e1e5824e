//! Error taxonomy for metaspn-core.
//!
//! Parse-time failures (missing fields, impossible coercions, unknown payload
//! types) propagate to the immediate caller as `SchemaError`. Validation-time
//! failures are deliberately *not* errors: validators return a
//! [`crate::verdict::Verdict`] so a caller can see every violation at once.

use thiserror::Error;

/// Convenience result alias used throughout metaspn crates.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors surfaced while decoding or dispatching schema payloads.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A required field (one with no declared default) was absent from the
    /// input tree. Raised before any coercion is attempted for that field.
    #[error("missing required field: {field}")]
    MissingField { field: String },

    /// A present value could not be converted to the field's declared type.
    /// For unions this carries the failure of the last alternative tried.
    #[error("cannot coerce field '{field}' to {expected}: {detail}")]
    Coercion {
        field: String,
        expected: &'static str,
        detail: String,
    },

    /// A dispatch lookup by logical payload-type name found no handler.
    #[error("unknown payload type: {0}")]
    UnknownPayloadType(String),

    /// A timestamp string could not be parsed.
    #[error("invalid timestamp '{value}': {detail}")]
    Timestamp { value: String, detail: String },

    /// Catch-all for malformed caller input (non-object trees, bad prefixes).
    #[error("{0}")]
    InvalidArgument(String),
}

impl SchemaError {
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub fn coercion(
        field: impl Into<String>,
        expected: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self::Coercion {
            field: field.into(),
            expected,
            detail: detail.into(),
        }
    }

    pub fn unknown_payload_type(name: impl Into<String>) -> Self {
        Self::UnknownPayloadType(name.into())
    }

    pub fn timestamp(value: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Timestamp {
            value: value.into(),
            detail: detail.into(),
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_stable() {
        let e = SchemaError::missing_field("signal_id");
        assert_eq!(e.to_string(), "missing required field: signal_id");

        let e = SchemaError::coercion("score", "float", "found bool");
        assert_eq!(e.to_string(), "cannot coerce field 'score' to float: found bool");

        let e = SchemaError::unknown_payload_type("Mystery");
        assert_eq!(e.to_string(), "unknown payload type: Mystery");
    }
}
