//! Date/time conversions, with and without a calendar.
//!
//! Zone-less cells (`Date`, `Timestamp`, parsed text) are wall-clock values.
//! Without a calendar they are read as recorded in the result's default zone;
//! with one, in the calendar's zone. `TimestampTz` cells are already instants
//! and ignore the calendar when resolved.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use std::borrow::Cow;

use crate::types::{Calendar, Value};

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Interpret text as a temporal value, most specific form first.
fn parse_text(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(Value::TimestampTz(dt));
    }
    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f %:z") {
        return Some(Value::TimestampTz(dt));
    }
    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Value::Timestamp(ts));
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(Value::Date(d));
    }
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .ok()
        .map(Value::Time)
}

/// The cell as a temporal value, parsing text.
fn temporal(value: &Value) -> Option<Cow<'_, Value>> {
    match value {
        Value::Date(_) | Value::Time(_) | Value::Timestamp(_) | Value::TimestampTz(_) => {
            Some(Cow::Borrowed(value))
        }
        Value::Text(s) => parse_text(s).map(Cow::Owned),
        _ => None,
    }
}

/// Wall-clock date and time of a zone-less value.
fn wall_clock(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Timestamp(ts) => Some(*ts),
        Value::Date(d) => Some(d.and_time(NaiveTime::MIN)),
        _ => None,
    }
}

/// Instant of a cell, reading zone-less values as recorded in `zone`.
pub(crate) fn instant(value: &Value, zone: FixedOffset) -> Option<DateTime<FixedOffset>> {
    match &*temporal(value)? {
        Value::TimestampTz(dt) => Some(*dt),
        other => zone.from_local_datetime(&wall_clock(other)?).single(),
    }
}

pub(crate) fn naive_datetime(value: &Value, default_zone: FixedOffset) -> Option<NaiveDateTime> {
    match &*temporal(value)? {
        Value::TimestampTz(dt) => Some(dt.with_timezone(&default_zone).naive_local()),
        other => wall_clock(other),
    }
}

pub(crate) fn naive_date(value: &Value, default_zone: FixedOffset) -> Option<NaiveDate> {
    match &*temporal(value)? {
        Value::Date(d) => Some(*d),
        other => naive_datetime(other, default_zone).map(|ts| ts.date()),
    }
}

pub(crate) fn naive_time(value: &Value, default_zone: FixedOffset) -> Option<NaiveTime> {
    match &*temporal(value)? {
        Value::Time(t) => Some(*t),
        Value::Date(_) => None,
        other => naive_datetime(other, default_zone).map(|ts| ts.time()),
    }
}

/// Instant of a cell whose zone-less values were recorded in `calendar`'s zone.
pub(crate) fn calendar_instant(
    value: &Value,
    calendar: &Calendar,
) -> Option<DateTime<FixedOffset>> {
    match &*temporal(value)? {
        Value::TimestampTz(dt) => Some(*dt),
        other => calendar.resolve(wall_clock(other)?).ok(),
    }
}

/// The calendar instant as default-zone wall clock.
pub(crate) fn calendar_datetime(
    value: &Value,
    calendar: &Calendar,
    default_zone: FixedOffset,
) -> Option<NaiveDateTime> {
    calendar_instant(value, calendar).map(|dt| dt.with_timezone(&default_zone).naive_local())
}

/// A date cell has no time of day to shift, so it is returned unchanged.
pub(crate) fn calendar_date(
    value: &Value,
    calendar: &Calendar,
    default_zone: FixedOffset,
) -> Option<NaiveDate> {
    match &*temporal(value)? {
        Value::Date(d) => Some(*d),
        other => calendar_datetime(other, calendar, default_zone).map(|ts| ts.date()),
    }
}

/// A time cell is shifted from the calendar's zone to the default zone,
/// wrapping around midnight.
pub(crate) fn calendar_time(
    value: &Value,
    calendar: &Calendar,
    default_zone: FixedOffset,
) -> Option<NaiveTime> {
    match &*temporal(value)? {
        Value::Time(t) => {
            let delta = default_zone.local_minus_utc() - calendar.zone().local_minus_utc();
            Some(t.overflowing_add_signed(Duration::seconds(delta as i64)).0)
        }
        Value::Date(_) => None,
        other => calendar_datetime(other, calendar, default_zone).map(|ts| ts.time()),
    }
}
