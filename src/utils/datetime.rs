use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Timelike, Utc};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Fixed-width UTC timestamp used for every TEXT timestamp column, so that
/// lexicographic order in SQL equals chronological order.
pub fn to_db_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn now_timestamp() -> String {
    to_db_timestamp(&Utc::now())
}

pub fn parse_db_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parses a 24 hour clock time such as `08:00`, `8:15` or `19.30`.
pub fn parse_clock_time(input: &str) -> Result<NaiveTime> {
    let input = input.trim();
    let (hours, minutes) = input
        .split_once(':')
        .or_else(|| input.split_once('.'))
        .ok_or_else(|| anyhow!("Time '{}' must look like HH:MM", input))?;

    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return Err(anyhow!("Time '{}' must look like HH:MM", input));
    }

    let hours: u32 = hours
        .parse()
        .map_err(|_| anyhow!("Invalid hour in '{}'", input))?;
    let minutes: u32 = minutes
        .parse()
        .map_err(|_| anyhow!("Invalid minute in '{}'", input))?;

    NaiveTime::from_hms_opt(hours, minutes, 0)
        .ok_or_else(|| anyhow!("Time '{}' is out of range", input))
}

pub fn format_clock_time(time: &NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Minutes between two clock times, wrapping around midnight.
pub fn clock_distance_minutes(a: &NaiveTime, b: &NaiveTime) -> i64 {
    let a = i64::from(a.hour() * 60 + a.minute());
    let b = i64::from(b.hour() * 60 + b.minute());
    let diff = (a - b).abs();
    diff.min(MINUTES_PER_DAY - diff)
}

pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid date '{}'. Use YYYY-MM-DD, e.g. 2025-09-01", input.trim()))
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format("%A, %B %d, %Y").to_string()
}
