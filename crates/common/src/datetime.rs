//! DateTime utilities.
//!
//! This module provides helper functions for working with dates, times and
//! fixed timezone offsets written as `"+HH:MM"`.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SubsecRound, TimeZone, Utc};
use thiserror::Error;

/// Default format used by [`datetime_to_str`]
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Errors produced by the date/time helpers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateTimeError {
    /// Timezone string is not of the form `[+-]HH:MM`
    #[error("invalid timezone '{0}', expected [+-]HH:MM")]
    InvalidTimezone(String),

    /// Hours part of a timezone is larger than 23
    #[error("abs(hours) > 23 (hours={0})")]
    HoursOutOfRange(String),

    /// Minutes part of a timezone is outside 0..=59
    #[error("minutes > 59 or minutes < 0 (minutes={0})")]
    MinutesOutOfRange(String),

    /// Date string is not an ISO 8601 calendar date
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// Get the current UTC time.
///
/// # Examples
///
/// ```
/// use articles_common::datetime::now_utc;
///
/// let now = now_utc();
/// println!("Current time: {}", now);
/// ```
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Get the current UTC time without sub-second precision.
pub fn now_utc_seconds() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Get today's date in UTC.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parse an ISO 8601 calendar date (`YYYY-MM-DD`).
///
/// # Examples
///
/// ```
/// use articles_common::datetime::parse_date;
///
/// let date = parse_date("2022-04-26").unwrap();
/// assert_eq!(date.to_string(), "2022-04-26");
/// ```
pub fn parse_date(date_str: &str) -> Result<NaiveDate, DateTimeError> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|_| DateTimeError::InvalidDate(date_str.to_string()))
}

/// Convert a timezone of the form `"+HH:MM"` into a fixed offset.
///
/// The sign is optional; hours must not exceed 23 and minutes must be
/// within `0..=59`.
///
/// # Examples
///
/// ```
/// use articles_common::datetime::tz_offset_from_str;
///
/// let offset = tz_offset_from_str("-01:30").unwrap();
/// assert_eq!(offset.local_minus_utc(), -90 * 60);
/// ```
pub fn tz_offset_from_str(tz: &str) -> Result<FixedOffset, DateTimeError> {
    let (h, m) = tz
        .split_once(':')
        .ok_or_else(|| DateTimeError::InvalidTimezone(tz.to_string()))?;

    let sign = if tz.starts_with('-') { -1 } else { 1 };

    let hours = h
        .parse::<i32>()
        .map_err(|_| DateTimeError::InvalidTimezone(tz.to_string()))?
        .abs();
    let minutes = m
        .parse::<i32>()
        .map_err(|_| DateTimeError::InvalidTimezone(tz.to_string()))?;

    if hours > 23 {
        return Err(DateTimeError::HoursOutOfRange(h.to_string()));
    }
    if !(0..=59).contains(&minutes) {
        return Err(DateTimeError::MinutesOutOfRange(m.to_string()));
    }

    let seconds = (hours * 60 + minutes) * 60 * sign;

    FixedOffset::east_opt(seconds).ok_or_else(|| DateTimeError::InvalidTimezone(tz.to_string()))
}

/// Convert a datetime into the timezone `target_tz`.
pub fn convert_timezone<Tz: TimeZone>(
    dt: &DateTime<Tz>,
    target_tz: &str,
) -> Result<DateTime<FixedOffset>, DateTimeError> {
    let offset = tz_offset_from_str(target_tz)?;
    Ok(dt.with_timezone(&offset))
}

/// Convert a naive datetime, taken to be UTC, into the timezone `target_tz`.
pub fn convert_naive_timezone(
    dt: &NaiveDateTime,
    target_tz: &str,
) -> Result<DateTime<FixedOffset>, DateTimeError> {
    convert_timezone(&Utc.from_utc_datetime(dt), target_tz)
}

/// Format a datetime in the timezone `target_tz` using a strftime `format`.
///
/// # Examples
///
/// ```
/// use articles_common::datetime::{datetime_to_str, DEFAULT_DATETIME_FORMAT};
/// use chrono::{TimeZone, Utc};
///
/// let dt = Utc.with_ymd_and_hms(2022, 4, 18, 21, 0, 0).unwrap();
/// let s = datetime_to_str(&dt, "+01:00", DEFAULT_DATETIME_FORMAT).unwrap();
/// assert_eq!(s, "2022-04-18T22:00:00+0100");
/// ```
pub fn datetime_to_str<Tz: TimeZone>(
    dt: &DateTime<Tz>,
    target_tz: &str,
    format: &str,
) -> Result<String, DateTimeError> {
    Ok(convert_timezone(dt, target_tz)?.format(format).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn minutes(tz: &str) -> i32 {
        tz_offset_from_str(tz).unwrap().local_minus_utc() / 60
    }

    #[test]
    fn test_tz_offset_from_str() {
        assert_eq!(minutes("00:00"), 0);
        assert_eq!(minutes("+01:00"), 60);
        assert_eq!(minutes("-01:00"), -60);
        assert_eq!(minutes("01:30"), 90);
        assert_eq!(minutes("-01:30"), -90);
        assert_eq!(minutes("-00:30"), -30);
    }

    #[test]
    fn test_tz_offset_wrong_hours_minutes() {
        let err = tz_offset_from_str("24:00").unwrap_err();
        assert!(err.to_string().contains("24"));

        let err = tz_offset_from_str("-24:00").unwrap_err();
        assert!(err.to_string().contains("-24"));

        let err = tz_offset_from_str("-00:60").unwrap_err();
        assert!(err.to_string().contains("60"));

        let err = tz_offset_from_str("00:-60").unwrap_err();
        assert!(err.to_string().contains("-60"));
    }

    #[test]
    fn test_tz_offset_malformed() {
        assert!(matches!(
            tz_offset_from_str("0100"),
            Err(DateTimeError::InvalidTimezone(_))
        ));
        assert!(matches!(
            tz_offset_from_str("ab:cd"),
            Err(DateTimeError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn test_convert_timezone() {
        let naive = NaiveDate::from_ymd_opt(2022, 4, 18)
            .unwrap()
            .and_hms_opt(21, 0, 0)
            .unwrap();
        let aware = Utc.from_utc_datetime(&naive);

        // defaults to utc
        let result = convert_naive_timezone(&naive, "+00:00").unwrap();
        assert_eq!(result.to_rfc3339(), "2022-04-18T21:00:00+00:00");
        let result = convert_timezone(&aware, "+00:00").unwrap();
        assert_eq!(result.to_rfc3339(), "2022-04-18T21:00:00+00:00");

        let result = convert_naive_timezone(&naive, "01:00").unwrap();
        assert_eq!(result.to_rfc3339(), "2022-04-18T22:00:00+01:00");
        let result = convert_timezone(&aware, "+01:00").unwrap();
        assert_eq!(result.to_rfc3339(), "2022-04-18T22:00:00+01:00");

        let result = convert_naive_timezone(&naive, "-01:30").unwrap();
        assert_eq!(result.to_rfc3339(), "2022-04-18T19:30:00-01:30");

        let result = convert_timezone(&aware, "-00:30").unwrap();
        assert_eq!(result.to_rfc3339(), "2022-04-18T20:30:00-00:30");
    }

    #[test]
    fn test_datetime_to_str() {
        let dt = Utc.with_ymd_and_hms(2022, 4, 18, 21, 0, 0).unwrap();
        let s = datetime_to_str(&dt, "-01:30", DEFAULT_DATETIME_FORMAT).unwrap();
        assert_eq!(s, "2022-04-18T19:30:00-0130");

        let s = datetime_to_str(&dt, "+00:00", "%Y-%m-%d").unwrap();
        assert_eq!(s, "2022-04-18");
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2022-04-26").unwrap(),
            NaiveDate::from_ymd_opt(2022, 4, 26).unwrap()
        );
        assert!(parse_date("26.04.2022").is_err());
        assert!(parse_date("2022-02-30").is_err());
    }

    #[test]
    fn test_now_utc_seconds_has_no_fraction() {
        assert_eq!(now_utc_seconds().nanosecond(), 0);
        assert!(now_utc() >= now_utc_seconds());
    }

    #[test]
    fn test_today_utc() {
        assert_eq!(today_utc(), now_utc().date_naive());
    }
}
