//! Parsing helpers for the ISO strings carried on the wire.
//!
//! The backend mixes full ISO-8601 timestamps and bare calendar dates for the
//! same fields, and clock times with or without seconds.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_instant(value).map(|dt| dt.date_naive()))
}

pub fn parse_clock(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

/// Parse an ISO-8601 timestamp; a bare calendar date resolves to its midnight (UTC).
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Combine a calendar date with a clock time (schedules are kept in UTC).
pub fn at(date: &str, clock: &str) -> Option<DateTime<Utc>> {
    let date = parse_date(date)?;
    let time = parse_clock(clock)?;
    Some(Utc.from_utc_datetime(&date.and_time(time)))
}
