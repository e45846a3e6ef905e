//! Output formatting helpers for commit ids and ages.

use crate::SHORT_HASH_LEN;
use chrono::{DateTime, Datelike, Utc};

/// Shortens a commit id to the display prefix.
#[must_use]
pub fn short_id(commit_id: &str) -> &str {
    &commit_id[..SHORT_HASH_LEN.min(commit_id.len())]
}

/// One duration component, pluralized ("1 year", "3 months").
fn component(amount: i64, unit: &str) -> String {
    if amount == 1 {
        format!("{amount} {unit}")
    } else {
        format!("{amount} {unit}s")
    }
}

/// Renders the age of a timestamp as calendar-aware human text.
///
/// Months and years are counted on the calendar; finer units divide the raw
/// duration. Anything under twenty seconds is "Just now".
#[must_use]
pub fn humanize_age(start: f64, end: f64) -> String {
    let seconds = end - start;
    let minutes = seconds / 60.0;
    let hours = minutes / 60.0;
    let days = hours / 24.0;

    let start_dt = datetime_from_epoch(start);
    let end_dt = datetime_from_epoch(end);
    let months = 12 * i64::from(end_dt.year() - start_dt.year())
        + i64::from(end_dt.month()) - i64::from(start_dt.month());
    let years = months / 12;

    let mut parts = Vec::new();
    if years >= 5 {
        parts.push(component(years, "year"));
    } else if years >= 1 {
        parts.push(component(years, "year"));
        parts.push(component(months % 12, "month"));
    } else if months >= 1 {
        parts.push(component(months % 12, "month"));
    } else if days >= 1.0 {
        parts.push(component(days as i64, "day"));
    } else if hours >= 1.0 {
        parts.push(component(hours as i64, "hour"));
    } else if minutes >= 1.0 {
        parts.push(component(minutes as i64, "minute"));
    } else if seconds >= 20.0 {
        parts.push(component(seconds as i64, "second"));
    } else {
        return "Just now".to_string();
    }
    format!("{} ago", parts.join(", "))
}

/// Converts fractional epoch seconds into a UTC datetime, clamping on error.
#[must_use]
pub fn datetime_from_epoch(timestamp: f64) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp as i64, 0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: f64 = 3600.0;
    const DAY: f64 = 24.0 * HOUR;

    #[test]
    fn just_now_under_twenty_seconds() {
        assert_eq!(humanize_age(1000.0, 1010.0), "Just now");
    }

    #[test]
    fn seconds_then_minutes_then_hours() {
        assert_eq!(humanize_age(1000.0, 1045.0), "45 seconds ago");
        assert_eq!(humanize_age(1000.0, 1000.0 + 5.0 * 60.0), "5 minutes ago");
        assert_eq!(humanize_age(1000.0, 1000.0 + 3.0 * HOUR), "3 hours ago");
        assert_eq!(humanize_age(1000.0, 1000.0 + 2.0 * DAY), "2 days ago");
    }

    #[test]
    fn singular_units() {
        assert_eq!(humanize_age(1000.0, 1000.0 + 60.0), "1 minute ago");
        assert_eq!(humanize_age(1000.0, 1000.0 + DAY), "1 day ago");
    }

    #[test]
    fn calendar_months_and_years() {
        // 2020-01-15 -> 2020-04-15 is three calendar months.
        let start = 1_579_046_400.0;
        let end = start + 91.0 * DAY;
        assert_eq!(humanize_age(start, end), "3 months ago");

        // Fourteen months reads as a year and change.
        let end = start + 426.0 * DAY;
        assert_eq!(humanize_age(start, end), "1 year, 2 months ago");
    }

    #[test]
    fn short_id_is_prefix() {
        assert_eq!(short_id("0123456789abcdef"), "0123456");
        assert_eq!(short_id("012"), "012");
    }
}
