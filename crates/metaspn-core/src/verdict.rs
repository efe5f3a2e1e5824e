//! Validation verdicts.
//!
//! Validators never fail with an error for a structural violation: they
//! collect every violation into an ordered, duplicate-free list of
//! human-readable reasons so a caller can act on all of them at once.
//! Only unrecoverable parse failures short-circuit, and even those are
//! folded into the reasons list as a `parse_error` entry.

use std::fmt::Display;

/// The outcome of a structural validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub is_valid: bool,
    /// Ordered, deduplicated reason strings; empty when valid.
    pub reasons: Vec<String>,
}

impl Verdict {
    /// A passing verdict with no reasons.
    pub fn pass() -> Self {
        Self {
            is_valid: true,
            reasons: Vec::new(),
        }
    }

    /// Build a verdict from collected reasons, deduplicating while
    /// preserving first-occurrence order. Empty reasons means valid.
    pub fn from_reasons(reasons: Vec<String>) -> Self {
        let mut deduped: Vec<String> = Vec::with_capacity(reasons.len());
        for reason in reasons {
            if !deduped.contains(&reason) {
                deduped.push(reason);
            }
        }
        Self {
            is_valid: deduped.is_empty(),
            reasons: deduped,
        }
    }

    /// Fold an unrecoverable parse failure into a failing verdict.
    pub fn parse_error(err: impl Display) -> Self {
        Self {
            is_valid: false,
            reasons: vec![format!("parse_error: {err}")],
        }
    }

    /// Fold an unknown payload-type lookup into a failing verdict.
    pub fn unknown_payload_type(name: &str) -> Self {
        Self {
            is_valid: false,
            reasons: vec![format!("unknown_payload_type: {name}")],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_reasons_pass() {
        let v = Verdict::from_reasons(Vec::new());
        assert!(v.is_valid);
        assert!(v.reasons.is_empty());
    }

    #[test]
    fn reasons_dedupe_preserving_order() {
        let v = Verdict::from_reasons(vec![
            "b".to_string(),
            "a".to_string(),
            "b".to_string(),
        ]);
        assert!(!v.is_valid);
        assert_eq!(v.reasons, vec!["b", "a"]);
    }

    #[test]
    fn parse_error_is_prefixed() {
        let v = Verdict::parse_error("missing required field: states");
        assert!(!v.is_valid);
        assert_eq!(v.reasons, vec!["parse_error: missing required field: states"]);
    }
}
