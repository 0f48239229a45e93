//! Timestamp parsing and normalization.
//!
//! Every timestamp is reduced to a zone-naive value with second granularity.
//! Fractional seconds are truncated, so two instants inside the same second
//! compare equal after normalization. Offset-carrying inputs are converted to
//! UTC before the offset is dropped.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};

/// Output format for the `Time` column.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Parse a raw column value. Returns `None` for empty or unrecognized input.
pub fn parse(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return truncate(dt.naive_utc());
    }

    // RFC 3339 minus the colon in the offset
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return truncate(dt.naive_utc());
    }

    // "2020-01-01 10:00:00 +00:00" style offsets
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f %:z") {
        return truncate(dt.naive_utc());
    }

    // trailing Z without the T separator
    let s = s.strip_suffix('Z').unwrap_or(s);

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return truncate(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Render a normalized timestamp the way every sink writes it.
pub fn format(ts: &NaiveDateTime) -> String {
    ts.format(TIME_FORMAT).to_string()
}

fn truncate(dt: NaiveDateTime) -> Option<NaiveDateTime> {
    dt.with_nanosecond(0)
}
