//! Reusable formatting utilities for CLI output

use std::time::Duration;

use chrono::{NaiveDateTime, TimeZone, Utc};

/// Layout of image creation dates.
const CREATION_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Format an image creation date as local date/time.
///
/// Returns "N/A" if the date is empty or unparsable.
///
/// # Example output
/// `11/29/2017 08:00 PST`
pub fn format_creation_date(date: &str) -> String {
    let Ok(naive) = NaiveDateTime::parse_from_str(date, CREATION_DATE_FORMAT) else {
        return "N/A".to_string();
    };

    let local = Utc.from_utc_datetime(&naive).with_timezone(&chrono::Local);
    let date_time = local.format("%m/%d/%Y %H:%M").to_string();
    let tz_abbrev = offset_to_tz_abbrev(local.offset().local_minus_utc());
    format!("{} {}", date_time, tz_abbrev)
}

/// Convert UTC offset (seconds) to timezone abbreviation.
///
/// Falls back to `UTC+N` format for uncommon offsets.
pub fn offset_to_tz_abbrev(offset_secs: i32) -> String {
    let offset_hours = offset_secs / 3600;
    let abbrev = match offset_hours {
        -10 => "HST",
        -9 => "AKST",
        -8 => "PST",
        -7 => "MST",
        -6 => "CST",
        -5 => "EST",
        0 => "UTC",
        1 => "CET",
        2 => "EET",
        9 => "JST",
        10 => "AEST",
        _ => return format!("UTC{:+}", offset_hours),
    };
    abbrev.to_string()
}

/// Format a duration to a human-readable string.
///
/// # Example output
/// - `2h 15m 30s` (hours, minutes, seconds)
/// - `5m 10s` (minutes, seconds)
/// - `45s` (seconds only)
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Shorten `text` to `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}
