//! Relative "time ago" labels for submitted articles.
//!
//! Submissions carry either a timestamp (`2024-09-01T10:15:00Z`,
//! `2024-09-01 10:15:00`, `2024-09-01`) or a short relative duration
//! (`2h 15m`, `45m`). Both are turned into a Nepali label such as
//! `३० मिनेट अघि` at submission time.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static RELATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:(?P<h>\d+)\s*h\s+)?(?P<m>\d+)\s*m\s*$").expect("relative duration regex")
});

const MINUTE_UNIT: &str = "मिनेट";
const HOUR_UNIT: &str = "घण्टा";
const DAY_UNIT: &str = "दिन";
const AGO: &str = "अघि";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeFormatError {
    #[error("unrecognised date or duration: {0:?}")]
    Unrecognised(String),
}

/// Label `input` relative to the current wall clock.
pub fn elapsed(input: &str) -> Result<String, TimeFormatError> {
    elapsed_at(input, Utc::now())
}

/// Label `input` relative to `now`.
///
/// # Arguments
///
/// * `input` - `[Xh ]Ym` duration or an ISO-ish timestamp
/// * `now` - The instant the label is relative to
///
/// # Returns
///
/// A Nepali "… अघि" label, or [`TimeFormatError::Unrecognised`] when the
/// input has neither shape or describes an instant chrono cannot represent.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(elapsed_at("2h 15m", now)?, "२ घण्टा अघि");
/// ```
pub fn elapsed_at(input: &str, now: DateTime<Utc>) -> Result<String, TimeFormatError> {
    let then = resolve(input, now)?;
    let minutes = (now - then).num_minutes().max(0);
    Ok(label(minutes))
}

/// Turn either accepted input shape into an absolute instant.
fn resolve(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, TimeFormatError> {
    if let Some(caps) = RELATIVE_RE.captures(input) {
        let hours: i64 = match caps.name("h") {
            Some(h) => h.as_str().parse().map_err(|_| unrecognised(input))?,
            None => 0,
        };
        let minutes: i64 = caps["m"].parse().map_err(|_| unrecognised(input))?;
        return hours
            .checked_mul(60)
            .and_then(|h| h.checked_add(minutes))
            .and_then(TimeDelta::try_minutes)
            .and_then(|ago| now.checked_sub_signed(ago))
            .ok_or_else(|| unrecognised(input));
    }

    let trimmed = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        && let Some(naive) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(naive.and_utc());
    }
    Err(unrecognised(input))
}

fn unrecognised(input: &str) -> TimeFormatError {
    TimeFormatError::Unrecognised(input.to_string())
}

/// Bucket a whole-minute age: minutes under an hour, hours under a day,
/// days beyond that.
fn label(minutes: i64) -> String {
    let (n, unit) = if minutes < 60 {
        (minutes, MINUTE_UNIT)
    } else if minutes < 24 * 60 {
        (minutes / 60, HOUR_UNIT)
    } else {
        (minutes / (24 * 60), DAY_UNIT)
    };
    format!("{} {unit} {AGO}", nepali_digits(n))
}

/// Render ASCII digits as Devanagari digits (`2024` -> `२०२४`).
pub fn nepali_digits(n: i64) -> String {
    n.to_string()
        .chars()
        .map(|c| match c.to_digit(10) {
            Some(d) => char::from_u32('०' as u32 + d).unwrap_or(c),
            None => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_minutes_only_duration() {
        assert_eq!(elapsed_at("30m", now()).unwrap(), "३० मिनेट अघि");
    }

    #[test]
    fn test_hours_and_minutes_duration() {
        assert_eq!(elapsed_at("2h 15m", now()).unwrap(), "२ घण्टा अघि");
    }

    #[test]
    fn test_exactly_sixty_minutes_is_an_hour() {
        assert_eq!(elapsed_at("60m", now()).unwrap(), "१ घण्टा अघि");
        assert_eq!(elapsed_at("59m", now()).unwrap(), "५९ मिनेट अघि");
    }

    #[test]
    fn test_iso_timestamp_25_hours_back_is_a_day() {
        let then = now() - TimeDelta::hours(25);
        assert_eq!(elapsed_at(&then.to_rfc3339(), now()).unwrap(), "१ दिन अघि");
    }

    #[test]
    fn test_naive_timestamp_formats() {
        assert_eq!(
            elapsed_at("2024-09-01 11:00:00", now()).unwrap(),
            "१ घण्टा अघि"
        );
        assert_eq!(
            elapsed_at("2024-09-01T09:30:00", now()).unwrap(),
            "२ घण्टा अघि"
        );
        assert_eq!(elapsed_at("2024-08-29", now()).unwrap(), "३ दिन अघि");
    }

    #[test]
    fn test_future_timestamp_clamps_to_zero() {
        let then = now() + TimeDelta::hours(3);
        assert_eq!(elapsed_at(&then.to_rfc3339(), now()).unwrap(), "० मिनेट अघि");
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            elapsed_at("yesterday-ish", now()),
            Err(TimeFormatError::Unrecognised(_))
        ));
        assert!(elapsed_at("5h", now()).is_err());
    }

    #[test]
    fn test_out_of_range_durations_are_rejected() {
        for input in ["999999999999999m", "1000000000000m", "99999999999999999999h 5m"] {
            assert_eq!(
                elapsed_at(input, now()),
                Err(TimeFormatError::Unrecognised(input.to_string())),
                "{input}"
            );
        }
        assert_eq!(elapsed_at("99999999999999999999m", now()).ok(), None);
    }

    #[test]
    fn test_large_but_representable_duration() {
        assert_eq!(elapsed_at("1000000h 0m", now()).unwrap(), "४१६६६ दिन अघि");
    }

    #[test]
    fn test_nepali_digits() {
        assert_eq!(nepali_digits(2024), "२०२४");
        assert_eq!(nepali_digits(0), "०");
    }
}
