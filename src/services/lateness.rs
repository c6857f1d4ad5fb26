//! Lateness arithmetic against the configurable in-time threshold.

use chrono::NaiveTime;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimeParseError {
    #[error("Invalid time format, expected HH:MM:SS")]
    InTime,

    #[error("Invalid time format, expected HH:MM")]
    Threshold,
}

/// Parses a clock-in time in `HH:MM:SS` form.
pub fn parse_in_time(value: &str) -> Result<NaiveTime, TimeParseError> {
    NaiveTime::parse_from_str(value, "%H:%M:%S").map_err(|_| TimeParseError::InTime)
}

/// Parses the in-time threshold in `HH:MM` form.
pub fn parse_threshold(value: &str) -> Result<NaiveTime, TimeParseError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| TimeParseError::Threshold)
}

/// How late `in_time` is past `threshold`, as a human string.
///
/// Arriving at or before the threshold is on time and yields `None`.
/// A positive delta renders as `"H hr M min"` with the hour part omitted
/// when zero.
#[must_use]
pub fn compute_late_time(in_time: NaiveTime, threshold: NaiveTime) -> Option<String> {
    if in_time <= threshold {
        return None;
    }

    let delta = in_time.signed_duration_since(threshold);
    let hours = delta.num_hours();
    let minutes = delta.num_minutes() % 60;

    if hours > 0 {
        Some(format!("{hours} hr {minutes} min"))
    } else {
        Some(format!("{minutes} min"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn late(in_time: &str, threshold: &str) -> Option<String> {
        compute_late_time(
            parse_in_time(in_time).unwrap(),
            parse_threshold(threshold).unwrap(),
        )
    }

    #[test]
    fn test_on_time_at_threshold() {
        assert_eq!(late("09:30:00", "09:30"), None);
    }

    #[test]
    fn test_early_arrival() {
        assert_eq!(late("08:15:42", "09:30"), None);
    }

    #[test]
    fn test_one_minute_late() {
        assert_eq!(late("09:31:00", "09:30"), Some("1 min".to_string()));
    }

    #[test]
    fn test_sub_minute_lateness_rounds_down() {
        // 09:30:59 is past the threshold but under a full minute.
        assert_eq!(late("09:30:59", "09:30"), Some("0 min".to_string()));
    }

    #[test]
    fn test_hours_and_minutes() {
        assert_eq!(late("11:05:00", "09:30"), Some("1 hr 35 min".to_string()));
    }

    #[test]
    fn test_exact_hours() {
        assert_eq!(late("11:30:00", "09:30"), Some("2 hr 0 min".to_string()));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_in_time("9:31").is_err());
        assert!(parse_in_time("25:00:00").is_err());
        assert!(parse_threshold("09:30:00").is_err());
        assert!(parse_threshold("abc").is_err());
    }
}
