//! Date and time utility functions
//!
//! Moodle web services exchange times as UNIX timestamps in seconds. This
//! module keeps the conversions in one place.

use chrono::{Local, TimeZone, Utc};

/// Date format used in generated files and CLI output
pub const DISPLAY_DATE_FORMAT: &str = "%Y-%m-%d";

/// Current UNIX time in seconds
pub fn timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Seconds elapsed between `since` and now, never negative
pub fn seconds_since(since: i64) -> i64 {
    (timestamp() - since).max(0)
}

/// Format a UNIX timestamp as local `YYYY-MM-DD HH:MM`
///
/// # Arguments
/// * `ts` - UNIX timestamp in seconds
///
/// # Returns
/// * `String` - Formatted local time, or "never" for 0 and unrepresentable values
pub fn format_timestamp(ts: i64) -> String {
    if ts <= 0 {
        return "never".to_string();
    }

    match Local.timestamp_opt(ts, 0).single() {
        Some(local) => local.format(&format!("{} %H:%M", DISPLAY_DATE_FORMAT)).to_string(),
        None => "never".to_string(),
    }
}
