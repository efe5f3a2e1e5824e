//! Static type descriptors for schema records.
//!
//! Each record type declares its wire shape once, as a `static` table of
//! [`FieldSpec`] entries. Coercion then dispatches over a closed set of
//! [`Kind`] variants instead of runtime type introspection, and the encode
//! path consults the same table for privacy filtering.
//!
//! Requirements:
//! - shapes are immutable after construction (they are `static` items)
//! - nested record shapes are referenced by `&'static` pointer, so arbitrary
//!   nesting costs nothing at runtime
//! - defaults are zero-value *constructors*, materialized fresh per decode,
//!   never shared instances

/// The semantic type of a single field, as seen by the coercion engine.
#[derive(Debug, Clone, Copy)]
pub enum Kind {
    /// UTF-8 string. Numbers are stringified on coercion.
    Str,
    /// Signed 64-bit integer. Numeric strings parse; floats truncate.
    Int,
    /// 64-bit float. Integers widen; numeric strings parse.
    Float,
    /// Boolean. The strings `"true"`/`"false"` parse.
    Bool,
    /// UTC timestamp, carried on the wire as a canonical string.
    Timestamp,
    /// Unconstrained value, passed through unchanged.
    Any,
    /// `T` or the null marker.
    Option(&'static Kind),
    /// Tagged union: alternatives are tried in declared order, first success
    /// wins; if none matches, the *last* failure is surfaced.
    Union(&'static [Kind]),
    /// Ordered sequence; element order is preserved exactly.
    Seq(&'static Kind),
    /// Set-like sequence, sorted ascending on construction.
    SortedSeq(&'static Kind),
    /// String-keyed mapping; input key order is irrelevant, output keys are
    /// always sorted.
    Map(&'static Kind),
    /// Nested schema record.
    Record(&'static RecordShape),
}

impl Kind {
    /// Short name used in coercion error messages.
    pub fn expected(&self) -> &'static str {
        match self {
            Kind::Str => "string",
            Kind::Int => "integer",
            Kind::Float => "float",
            Kind::Bool => "boolean",
            Kind::Timestamp => "timestamp",
            Kind::Any => "any",
            Kind::Option(_) => "optional value",
            Kind::Union(_) => "union",
            Kind::Seq(_) => "sequence",
            Kind::SortedSeq(_) => "sorted sequence",
            Kind::Map(_) => "mapping",
            Kind::Record(shape) => shape.name,
        }
    }
}

/// Zero-value constructor for a field absent from the input tree.
#[derive(Debug, Clone, Copy)]
pub enum FieldDefault {
    /// No default: absence is a `MissingField` error.
    Required,
    /// Defaults to the null marker (optional fields).
    Null,
    /// Fixed string default.
    Str(&'static str),
    /// Fixed integer default.
    Int(i64),
    /// Fixed boolean default.
    Bool(bool),
    /// The process-wide schema version constant.
    SchemaVersion,
    /// A fresh empty sequence per decode.
    EmptySeq,
    /// A fresh empty mapping per decode.
    EmptyMap,
}

/// Declaration of a single record field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: Kind,
    pub default: FieldDefault,
    /// When true, the field is dropped entirely from privacy-mode output.
    pub omit_in_privacy: bool,
}

impl FieldSpec {
    /// A field with no default; absence fails the decode.
    pub const fn required(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            kind,
            default: FieldDefault::Required,
            omit_in_privacy: false,
        }
    }

    /// An optional field defaulting to the null marker.
    pub const fn optional(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            kind: Kind::Option(leak(kind)),
            default: FieldDefault::Null,
            omit_in_privacy: false,
        }
    }

    /// A field with an explicit default constructor.
    pub const fn defaulted(name: &'static str, kind: Kind, default: FieldDefault) -> Self {
        Self {
            name,
            kind,
            default,
            omit_in_privacy: false,
        }
    }

    /// The conventional `schema_version` field carried by every record.
    pub const fn schema_version() -> Self {
        Self {
            name: "schema_version",
            kind: Kind::Str,
            default: FieldDefault::SchemaVersion,
            omit_in_privacy: false,
        }
    }

    /// Flag this field for omission under privacy mode.
    pub const fn privacy(mut self) -> Self {
        self.omit_in_privacy = true;
        self
    }
}

// `FieldSpec::optional` needs a `&'static Kind` for the wrapped inner kind.
// Constant promotion cannot apply to a runtime parameter, so the common inner
// kinds are interned here.
const fn leak(kind: Kind) -> &'static Kind {
    match kind {
        Kind::Str => &Kind::Str,
        Kind::Int => &Kind::Int,
        Kind::Float => &Kind::Float,
        Kind::Bool => &Kind::Bool,
        Kind::Timestamp => &Kind::Timestamp,
        Kind::Any => &Kind::Any,
        // Composite kinds must be declared as statics by the caller and
        // wrapped with `Kind::Option` directly.
        _ => panic!("FieldSpec::optional supports scalar kinds only; use Kind::Option"),
    }
}

/// The full wire shape of one record type.
#[derive(Debug)]
pub struct RecordShape {
    /// Logical record name, used in error messages.
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl RecordShape {
    /// Look up a field declaration by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static SHAPE: RecordShape = RecordShape {
        name: "Probe",
        fields: &[
            FieldSpec::required("id", Kind::Str),
            FieldSpec::optional("label", Kind::Str),
            FieldSpec::schema_version(),
        ],
    };

    #[test]
    fn field_lookup() {
        assert!(SHAPE.field("id").is_some());
        assert!(SHAPE.field("nope").is_none());
    }

    #[test]
    fn optional_wraps_inner_kind() {
        let spec = SHAPE.field("label").unwrap();
        assert!(matches!(spec.kind, Kind::Option(inner) if matches!(inner, Kind::Str)));
        assert!(matches!(spec.default, FieldDefault::Null));
    }

    #[test]
    fn privacy_flag_is_builder_applied() {
        const SPEC: FieldSpec = FieldSpec::required("raw", Kind::Any).privacy();
        assert!(SPEC.omit_in_privacy);
    }
}
