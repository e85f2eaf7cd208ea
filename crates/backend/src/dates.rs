//! Calendar date helpers.
//!
//! Entry dates are plain `YYYY-MM-DD` strings interpreted in the configured
//! timezone, so "today" is the user's calendar day rather than the server's.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use thiserror::Error;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum DateError {
    #[error("Invalid date: {0}")]
    InvalidFormat(String),

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is valid"))
}

/// Resolve an IANA timezone name such as `Asia/Tokyo`.
pub fn load_timezone(name: &str) -> Result<Tz, DateError> {
    Tz::from_str(name).map_err(|_| DateError::UnknownTimezone(name.to_string()))
}

/// Parse a zero-padded `YYYY-MM-DD` string into a calendar date.
///
/// chrono alone accepts `2013-1-1`, so the shape is checked first.
pub fn parse_naive_date(date: &str) -> Result<NaiveDate, DateError> {
    if !date_pattern().is_match(date) {
        return Err(DateError::InvalidFormat(date.to_string()));
    }
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map_err(|_| DateError::InvalidFormat(date.to_string()))
}

/// Parse a date string to midnight of that day in `tz`.
pub fn parse_date(date: &str, tz: Tz) -> Result<DateTime<Tz>, DateError> {
    let day = parse_naive_date(date)?;
    Ok(start_of_day(day, tz))
}

pub fn is_valid_date(date: &str) -> bool {
    parse_naive_date(date).is_ok()
}

pub fn date_string(year: i32, month: u32, day: u32) -> String {
    format!("{:04}-{:02}-{:02}", year, month, day)
}

pub fn date_string_of<D: Datelike>(t: &D) -> String {
    date_string(t.year(), t.month(), t.day())
}

/// Today's date in `tz`.
pub fn today_string(tz: Tz) -> String {
    today_string_at(Utc::now(), tz)
}

pub fn today_string_at(now: DateTime<Utc>, tz: Tz) -> String {
    date_string_of(&now.with_timezone(&tz))
}

/// Number of days in a month (1-based).
pub fn days_in(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

pub fn beginning_of_previous_month<Z: TimeZone>(t: &DateTime<Z>) -> DateTime<Z> {
    let (year, month) = if t.month() == 1 {
        (t.year() - 1, 12)
    } else {
        (t.year(), t.month() - 1)
    };
    first_of_month(year, month, t.timezone())
}

pub fn beginning_of_next_month<Z: TimeZone>(t: &DateTime<Z>) -> DateTime<Z> {
    let (year, month) = if t.month() == 12 {
        (t.year() + 1, 1)
    } else {
        (t.year(), t.month() + 1)
    };
    first_of_month(year, month, t.timezone())
}

fn first_of_month<Z: TimeZone>(year: i32, month: u32, tz: Z) -> DateTime<Z> {
    // month is always 1..=12 here
    let day = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN);
    start_of_day(day, tz)
}

fn start_of_day<Z: TimeZone>(day: NaiveDate, tz: Z) -> DateTime<Z> {
    let midnight = day.and_time(NaiveTime::default());
    match tz.from_local_datetime(&midnight).earliest() {
        Some(t) => t,
        // midnight skipped by a DST jump
        None => tz.from_utc_datetime(&midnight),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn tokyo() -> Tz {
        load_timezone("Asia/Tokyo").unwrap()
    }

    #[test]
    fn test_days_in() {
        assert_eq!(days_in(2012, 4), 30);
        assert_eq!(days_in(2012, 1), 31);
        assert_eq!(days_in(2013, 2), 28);
        assert_eq!(days_in(2012, 2), 29);
        assert_eq!(days_in(2013, 12), 31);
    }

    #[test]
    fn test_date_string() {
        assert_eq!(date_string(2012, 8, 8), "2012-08-08");
    }

    #[test]
    fn test_date_string_of_end_of_day() {
        let t = tokyo().with_ymd_and_hms(2013, 7, 8, 23, 59, 59).unwrap();
        assert_eq!(date_string_of(&t), "2013-07-08");
    }

    #[test]
    fn test_is_valid_date() {
        assert!(is_valid_date("1981-01-02"));
        assert!(is_valid_date("2013-01-01"));
        assert!(is_valid_date("2012-02-29"));
        assert!(!is_valid_date("1981-1-2"));
        assert!(!is_valid_date("2013-1-1"));
        assert!(!is_valid_date("hello"));
        assert!(!is_valid_date("2013-02-30"));
        assert!(!is_valid_date("2013-13-01"));
        assert!(!is_valid_date(" 2013-01-01"));
        assert!(!is_valid_date("2013-01-01/edit"));
    }

    #[test]
    fn test_today_string_shape() {
        let today = today_string(tokyo());
        assert!(date_pattern().is_match(&today), "{today}");
    }

    #[test]
    fn test_today_string_uses_timezone() {
        // 16:00 UTC is already the next day in Tokyo
        let now = Utc.with_ymd_and_hms(2014, 4, 1, 16, 0, 0).unwrap();
        assert_eq!(today_string_at(now, tokyo()), "2014-04-02");
        assert_eq!(today_string_at(now, chrono_tz::UTC), "2014-04-01");
    }

    #[test]
    fn test_parse_date() {
        let parsed = parse_date("2014-04-01", tokyo()).unwrap();
        let expected = Utc.with_ymd_and_hms(2014, 3, 31, 15, 0, 0).unwrap();
        assert_eq!(parsed.with_timezone(&Utc), expected);
        assert_eq!(parsed.hour(), 0);
    }

    #[test]
    fn test_parse_date_rejects_unpadded() {
        assert!(matches!(
            parse_date("2014-4-1", tokyo()),
            Err(DateError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_beginning_of_previous_month() {
        let t = tokyo().with_ymd_and_hms(2013, 7, 8, 23, 59, 59).unwrap();
        let expected = tokyo().with_ymd_and_hms(2013, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(beginning_of_previous_month(&t), expected);

        let january = tokyo().with_ymd_and_hms(2014, 1, 15, 0, 0, 0).unwrap();
        let december = tokyo().with_ymd_and_hms(2013, 12, 1, 0, 0, 0).unwrap();
        assert_eq!(beginning_of_previous_month(&january), december);
    }

    #[test]
    fn test_beginning_of_next_month() {
        let t = tokyo().with_ymd_and_hms(2013, 7, 8, 23, 59, 59).unwrap();
        let expected = tokyo().with_ymd_and_hms(2013, 8, 1, 0, 0, 0).unwrap();
        assert_eq!(beginning_of_next_month(&t), expected);

        let december = tokyo().with_ymd_and_hms(2013, 12, 31, 12, 0, 0).unwrap();
        let january = tokyo().with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(beginning_of_next_month(&december), january);
    }

    #[test]
    fn test_unknown_timezone() {
        assert!(matches!(
            load_timezone("Mars/Olympus_Mons"),
            Err(DateError::UnknownTimezone(_))
        ));
    }
}
