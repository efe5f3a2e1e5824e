//! Temporal normalization for metaspn contracts.
//!
//! Every timestamp that crosses the wire is expressed in UTC and rendered in
//! a single canonical string form:
//!
//! ```text
//! YYYY-MM-DDTHH:MM:SS(.ffffff)Z
//! ```
//!
//! Rules:
//! - a zero UTC offset is rendered as the literal `Z`, never `+00:00`
//! - fractional seconds are preserved (microsecond precision) when present,
//!   never synthesized when absent
//! - a parsed string with an explicit offset is converted to UTC
//! - a parsed string with *no* offset is assumed to already be UTC; this is a
//!   documented convention of the pipeline, not an inference
//!
//! These helpers are purely in-memory and deterministic.

use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::errors::{SchemaError, SchemaResult};

const BASE_FORMAT: &[time::format_description::FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// Current instant in UTC.
pub fn utc_now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Convert any offset-bearing timestamp to the equivalent UTC instant.
pub fn ensure_utc(value: OffsetDateTime) -> OffsetDateTime {
    value.to_offset(UtcOffset::UTC)
}

/// Render a timestamp in the canonical UTC string form.
pub fn format_utc(value: OffsetDateTime) -> String {
    let utc = ensure_utc(value);
    let mut out = format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
        utc.year(),
        u8::from(utc.month()),
        utc.day(),
        utc.hour(),
        utc.minute(),
        utc.second()
    );
    if utc.microsecond() != 0 {
        out.push_str(&format!(".{:06}", utc.microsecond()));
    }
    out.push('Z');
    out
}

/// Parse a canonical (or offset-bearing, or offset-free) timestamp string
/// into a UTC instant.
pub fn parse_utc(value: &str) -> SchemaResult<OffsetDateTime> {
    if let Some(body) = value.strip_suffix('Z') {
        return Ok(parse_naive(value, body)?.assume_utc());
    }
    if let Some((body, offset)) = split_offset(value) {
        let offset = parse_offset(offset)
            .ok_or_else(|| SchemaError::timestamp(value, "malformed UTC offset"))?;
        return Ok(ensure_utc(parse_naive(value, body)?.assume_offset(offset)));
    }
    // No offset information: assumed UTC by convention.
    Ok(parse_naive(value, value)?.assume_utc())
}

/// Convert integer epoch seconds to a UTC instant.
pub fn from_epoch_seconds(secs: i64) -> SchemaResult<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(secs)
        .map_err(|e| SchemaError::timestamp(secs.to_string(), e.to_string()))
}

/// Convert integer epoch seconds directly to the canonical UTC string form.
pub fn epoch_to_utc_string(secs: i64) -> SchemaResult<String> {
    Ok(format_utc(from_epoch_seconds(secs)?))
}

fn parse_naive(original: &str, body: &str) -> SchemaResult<PrimitiveDateTime> {
    let (base, fraction) = match body.split_once('.') {
        Some((base, fraction)) => (base, Some(fraction)),
        None => (body, None),
    };

    let parsed = PrimitiveDateTime::parse(base, BASE_FORMAT)
        .map_err(|e| SchemaError::timestamp(original, e.to_string()))?;

    let Some(fraction) = fraction else {
        return Ok(parsed);
    };
    if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SchemaError::timestamp(original, "malformed fractional seconds"));
    }

    // Microsecond precision: truncate longer fractions, right-pad shorter.
    let mut digits = String::from(&fraction[..fraction.len().min(6)]);
    while digits.len() < 6 {
        digits.push('0');
    }
    let micros: u32 = digits
        .parse()
        .map_err(|_| SchemaError::timestamp(original, "malformed fractional seconds"))?;

    parsed
        .replace_microsecond(micros)
        .map_err(|e| SchemaError::timestamp(original, e.to_string()))
}

/// Split `body±HH:MM` into the naive part and the offset suffix, if present.
fn split_offset(value: &str) -> Option<(&str, &str)> {
    let time_start = value.find('T')?;
    let rel = value[time_start..].find(['+', '-'])?;
    let idx = time_start + rel;
    Some((&value[..idx], &value[idx..]))
}

fn parse_offset(text: &str) -> Option<UtcOffset> {
    let (sign, rest) = text.split_at(1);
    let (hours, minutes) = rest.split_once(':')?;
    let mut hours: i8 = hours.parse().ok()?;
    let mut minutes: i8 = minutes.parse().ok()?;
    if sign == "-" {
        hours = -hours;
        minutes = -minutes;
    }
    UtcOffset::from_hms(hours, minutes, 0).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use time::macros::datetime;

    #[test]
    fn renders_zero_offset_as_literal_z() {
        let t = datetime!(2026-02-06 12:00:00 UTC);
        assert_eq!(format_utc(t), "2026-02-06T12:00:00Z");
    }

    #[test]
    fn converts_offsets_to_utc() {
        let t = datetime!(2026-02-06 08:00:00 -08:00);
        assert_eq!(format_utc(t), "2026-02-06T16:00:00Z");
        let parsed = parse_utc("2026-02-06T08:00:00-08:00").unwrap();
        assert_eq!(format_utc(parsed), "2026-02-06T16:00:00Z");
    }

    #[test]
    fn offset_free_strings_are_assumed_utc() {
        let parsed = parse_utc("2026-02-06T12:00:00").unwrap();
        assert_eq!(parsed, datetime!(2026-02-06 12:00:00 UTC));
    }

    #[test]
    fn fractional_seconds_preserved_not_synthesized() {
        let parsed = parse_utc("2026-02-06T12:00:00.250000Z").unwrap();
        assert_eq!(parsed.microsecond(), 250_000);
        assert_eq!(format_utc(parsed), "2026-02-06T12:00:00.250000Z");

        // No fraction in, no fraction out.
        let parsed = parse_utc("2026-02-06T12:00:00Z").unwrap();
        assert_eq!(format_utc(parsed), "2026-02-06T12:00:00Z");
    }

    #[test]
    fn positive_offsets_normalize() {
        let parsed = parse_utc("2026-02-06T17:30:00+05:30").unwrap();
        assert_eq!(format_utc(parsed), "2026-02-06T12:00:00Z");
    }

    #[test]
    fn epoch_conversion_matches_canonical_form() {
        assert_eq!(
            epoch_to_utc_string(1_762_502_400).unwrap(),
            "2025-11-07T08:00:00Z"
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_utc("not-a-timestamp").is_err());
        assert!(parse_utc("2026-02-06T12:00:00.abcZ").is_err());
    }

    proptest! {
        #[test]
        fn parse_inverts_format(secs in -2_000_000_000i64..4_000_000_000i64, micros in 0u32..1_000_000u32) {
            let t = from_epoch_seconds(secs)
                .unwrap()
                .replace_microsecond(micros)
                .unwrap();
            let rendered = format_utc(t);
            let parsed = parse_utc(&rendered).unwrap();
            prop_assert_eq!(parsed, ensure_utc(t));
        }
    }
}
