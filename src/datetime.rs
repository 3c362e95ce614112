//! Date/time utilities for Gator.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Storage format for timestamps.
///
/// Fixed width, always UTC, so that lexical order in SQL equals time order.
pub const STORAGE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9fZ";

/// Current time in UTC.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Encode a timestamp for storage.
pub fn to_storage(dt: &DateTime<Utc>) -> String {
    dt.format(STORAGE_FORMAT).to_string()
}

/// Decode a stored timestamp.
///
/// Accepts RFC3339 (which covers [`STORAGE_FORMAT`]) and the SQLite
/// `datetime('now')` format.
pub fn parse_storage(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

/// Parse a feed item's publication date.
///
/// Feeds carry RFC 2822 dates, e.g. `Mon, 02 Jan 2006 15:04:05 -0700`.
pub fn parse_publication_date(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc2822(s.trim()).map(|dt| dt.with_timezone(&Utc))
}

/// Format a timestamp as a calendar date for display.
pub fn format_date(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d").to_string()
}

/// Format a timestamp with seconds for display.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}
