//! metaspn-core
//!
//! Core primitives for the metaspn pipeline contracts:
//! - Static type descriptors for schema records
//! - Type-directed coercion between raw key/value trees and typed fields
//! - Canonical encoding (sorted mapping keys, UTC timestamp strings,
//!   construction-time sorted set sequences, privacy-mode field omission)
//! - UTC timestamp normalization and canonical rendering
//! - Opaque identifier generation
//! - Validation verdicts (collect-everything-wrong, never raise)
//!
//! The engine is purely functional over its inputs: no I/O, no shared
//! mutable state, no blocking. Concurrent callers need no coordination.

pub mod coerce;
pub mod descriptor;
pub mod errors;
pub mod ids;
pub mod record;
pub mod timestamp;
pub mod verdict;

pub use crate::errors::{SchemaError, SchemaResult};

/// Process-wide schema version injected when an input tree omits one.
pub const DEFAULT_SCHEMA_VERSION: &str = "0.9";

/// Logical package name carried by version-info records.
pub const PACKAGE_NAME: &str = "metaspn-schemas";

/// Convenience re-exports.
pub mod prelude {
    pub use crate::coerce::{coerce, decode_fields, default_value};
    pub use crate::descriptor::{FieldDefault, FieldSpec, Kind, RecordShape};
    pub use crate::ids::generate_id;
    pub use crate::record::{FieldValues, SchemaRecord, TreeBuilder};
    pub use crate::timestamp::{
        ensure_utc, epoch_to_utc_string, format_utc, from_epoch_seconds, parse_utc, utc_now,
    };
    pub use crate::verdict::Verdict;
    pub use crate::{SchemaError, SchemaResult, DEFAULT_SCHEMA_VERSION, PACKAGE_NAME};
}
