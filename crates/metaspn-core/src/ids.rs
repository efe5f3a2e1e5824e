//! Opaque identifier generation.
//!
//! Identifiers are uuid-v4 hex tokens with an optional semantic prefix.
//! Well-known prefixes are abbreviated so identifiers stay short on the wire;
//! unknown prefixes are normalized (trimmed, lowercased) and used verbatim.

use uuid::Uuid;

/// Map a well-known prefix to its abbreviated form.
fn short_prefix(prefix: &str) -> &str {
    match prefix {
        "signal" => "s",
        "emission" => "e",
        "task" => "t",
        "result" => "r",
        "entity" => "ent",
        other => other,
    }
}

/// Generate an opaque unique token, optionally prefixed.
///
/// `generate_id(None)` yields a bare 32-char hex token;
/// `generate_id(Some("signal"))` yields `s_<token>`.
pub fn generate_id(prefix: Option<&str>) -> String {
    let token = Uuid::new_v4().simple().to_string();
    match prefix {
        None => token,
        Some(raw) => {
            let normalized = raw.trim().to_ascii_lowercase();
            format!("{}_{token}", short_prefix(&normalized))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_token_is_hex() {
        let id = generate_id(None);
        assert_eq!(id.len(), 32);
        assert!(id.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn known_prefixes_are_abbreviated() {
        assert!(generate_id(Some("signal")).starts_with("s_"));
        assert!(generate_id(Some("emission")).starts_with("e_"));
        assert!(generate_id(Some("entity")).starts_with("ent_"));
    }

    #[test]
    fn unknown_prefixes_are_normalized() {
        assert!(generate_id(Some(" Window ")).starts_with("window_"));
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(generate_id(None), generate_id(None));
    }
}
