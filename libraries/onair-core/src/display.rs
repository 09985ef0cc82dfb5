//! Presentation helpers shared by the player surface

use chrono::{DateTime, Utc};

/// Location shown when an item carries none
pub const UNKNOWN_LOCATION: &str = "UNKNOWN";

/// Date shown when an item has no publish timestamp
pub const DATE_PLACEHOLDER: &str = "00.00.00";

/// Format a publish timestamp as `dd.mm.yy`
pub fn format_display_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%d.%m.%y").to_string()
}

/// Format a position in seconds as `m:ss`, or `h:mm:ss` past the hour
///
/// Negative and non-finite input renders as `0:00`.
pub fn format_clock(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }

    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}
