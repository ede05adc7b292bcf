//! Typed decoding of cells.
//!
//! Each supported target type implements [`FromValue`], and the temporal
//! ones also implement [`FromCalendarValue`]. Conversions are exact: a value
//! the target cannot represent fails with a conversion error instead of
//! wrapping, truncating or rounding.
//!
//! | Target | Accepted cells |
//! |---|---|
//! | `i8`..`u64` | integers, integral floats/decimals/text, booleans |
//! | `f32`, `f64` | numbers representable without overflow or integer precision loss |
//! | `bool` | booleans, `0`/`1`, `"true"`/`"false"` |
//! | `String` | anything but binary data and unread LOBs |
//! | `Bytes`, `Vec<u8>` | binary, BLOB, text, CLOB with data |
//! | chrono types | dates, times, timestamps, temporal text |

mod numeric;
mod temporal;

use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use self::numeric::IntegerError;
use crate::cursor::CellRef;
use crate::error::{Error, Result};
use crate::types::{Calendar, Value};

/// A type a cell can be decoded into.
pub trait FromValue: Sized {
    /// Decode a non-null cell.
    fn from_value(cell: &CellRef<'_>) -> Result<Self>;

    /// Value returned for a null cell.
    fn null_value() -> Self;
}

/// A type a temporal cell can be decoded into relative to a calendar.
pub trait FromCalendarValue: Sized {
    fn from_calendar_value(cell: &CellRef<'_>, calendar: &Calendar) -> Result<Self>;

    fn null_value() -> Self;
}

fn mismatch(cell: &CellRef<'_>, target: &str) -> Error {
    Error::type_conversion(format!(
        "cannot convert {} in column {} ({}) to {}",
        cell.value.kind_name(),
        cell.column.position,
        cell.column.label,
        target
    ))
}

fn out_of_range(cell: &CellRef<'_>, target: &str) -> Error {
    Error::type_conversion(format!(
        "{} in column {} ({}) is out of range for {}",
        cell.value, cell.column.position, cell.column.label, target
    ))
}

fn integer_error(cell: &CellRef<'_>, target: &str, err: IntegerError) -> Error {
    match err {
        IntegerError::Unsupported | IntegerError::Malformed => mismatch(cell, target),
        IntegerError::Fractional => Error::type_conversion(format!(
            "{} in column {} ({}) has a fractional part and cannot be read as {}",
            cell.value, cell.column.position, cell.column.label, target
        )),
        IntegerError::Overflow => out_of_range(cell, target),
    }
}

fn float_error(cell: &CellRef<'_>, target: &str) -> Error {
    match cell.value {
        Value::Int(_) | Value::UInt(_) | Value::Float(_) | Value::Decimal(_) => {
            Error::type_conversion(format!(
                "{} in column {} ({}) cannot be represented exactly as {}",
                cell.value, cell.column.position, cell.column.label, target
            ))
        }
        _ => mismatch(cell, target),
    }
}

fn unread_lob(cell: &CellRef<'_>) -> Error {
    Error::type_conversion(format!(
        "{} in column {} ({}) was not fetched inline; open it as a stream",
        cell.value.kind_name(),
        cell.column.position,
        cell.column.label
    ))
}

macro_rules! impl_from_value_int {
    ($($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn from_value(cell: &CellRef<'_>) -> Result<Self> {
                    let n = numeric::to_i128(cell.value)
                        .map_err(|e| integer_error(cell, stringify!($t), e))?;
                    <$t>::try_from(n).map_err(|_| out_of_range(cell, stringify!($t)))
                }

                fn null_value() -> Self {
                    0
                }
            }
        )*
    };
}

impl_from_value_int!(i8, i16, i32, i64, u8, u16, u32, u64);

impl FromValue for f64 {
    fn from_value(cell: &CellRef<'_>) -> Result<Self> {
        numeric::to_f64(cell.value).ok_or_else(|| float_error(cell, "f64"))
    }

    fn null_value() -> Self {
        0.0
    }
}

impl FromValue for f32 {
    fn from_value(cell: &CellRef<'_>) -> Result<Self> {
        numeric::to_f32(cell.value).ok_or_else(|| float_error(cell, "f32"))
    }

    fn null_value() -> Self {
        0.0
    }
}

impl FromValue for bool {
    fn from_value(cell: &CellRef<'_>) -> Result<Self> {
        numeric::to_bool(cell.value).ok_or_else(|| mismatch(cell, "bool"))
    }

    fn null_value() -> Self {
        false
    }
}

impl FromValue for String {
    fn from_value(cell: &CellRef<'_>) -> Result<Self> {
        match cell.value {
            Value::Text(s) | Value::Decimal(s) => Ok(s.clone()),
            Value::Clob(lob) => match &lob.data {
                Some(data) => String::from_utf8(data.to_vec()).map_err(|_| {
                    Error::protocol(format!(
                        "CLOB in column {} is not valid UTF-8",
                        cell.column.position
                    ))
                }),
                None => Err(unread_lob(cell)),
            },
            Value::Bytes(_) | Value::Blob(_) => Err(mismatch(cell, "String")),
            other => Ok(other.to_string()),
        }
    }

    fn null_value() -> Self {
        String::new()
    }
}

impl FromValue for Bytes {
    fn from_value(cell: &CellRef<'_>) -> Result<Self> {
        match cell.value {
            Value::Bytes(b) => Ok(b.clone()),
            Value::Text(s) => Ok(Bytes::copy_from_slice(s.as_bytes())),
            Value::Blob(lob) | Value::Clob(lob) => lob.data.clone().ok_or_else(|| unread_lob(cell)),
            _ => Err(mismatch(cell, "bytes")),
        }
    }

    fn null_value() -> Self {
        Bytes::new()
    }
}

impl FromValue for Vec<u8> {
    fn from_value(cell: &CellRef<'_>) -> Result<Self> {
        Bytes::from_value(cell).map(|b| b.to_vec())
    }

    fn null_value() -> Self {
        Vec::new()
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(cell: &CellRef<'_>) -> Result<Self> {
        temporal::naive_datetime(cell.value, cell.default_zone)
            .ok_or_else(|| mismatch(cell, "NaiveDateTime"))
    }

    fn null_value() -> Self {
        NaiveDateTime::default()
    }
}

impl FromValue for NaiveDate {
    fn from_value(cell: &CellRef<'_>) -> Result<Self> {
        temporal::naive_date(cell.value, cell.default_zone)
            .ok_or_else(|| mismatch(cell, "NaiveDate"))
    }

    fn null_value() -> Self {
        NaiveDate::default()
    }
}

impl FromValue for NaiveTime {
    fn from_value(cell: &CellRef<'_>) -> Result<Self> {
        temporal::naive_time(cell.value, cell.default_zone)
            .ok_or_else(|| mismatch(cell, "NaiveTime"))
    }

    fn null_value() -> Self {
        NaiveTime::default()
    }
}

impl FromValue for DateTime<FixedOffset> {
    fn from_value(cell: &CellRef<'_>) -> Result<Self> {
        temporal::instant(cell.value, cell.default_zone)
            .ok_or_else(|| mismatch(cell, "DateTime<FixedOffset>"))
    }

    fn null_value() -> Self {
        DateTime::<FixedOffset>::default()
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(cell: &CellRef<'_>) -> Result<Self> {
        temporal::instant(cell.value, cell.default_zone)
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| mismatch(cell, "DateTime<Utc>"))
    }

    fn null_value() -> Self {
        DateTime::<Utc>::default()
    }
}

impl FromValue for Value {
    fn from_value(cell: &CellRef<'_>) -> Result<Self> {
        Ok(cell.value.clone())
    }

    fn null_value() -> Self {
        Value::Null
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(cell: &CellRef<'_>) -> Result<Self> {
        T::from_value(cell).map(Some)
    }

    fn null_value() -> Self {
        None
    }
}

impl FromCalendarValue for NaiveDateTime {
    fn from_calendar_value(cell: &CellRef<'_>, calendar: &Calendar) -> Result<Self> {
        temporal::calendar_datetime(cell.value, calendar, cell.default_zone)
            .ok_or_else(|| mismatch(cell, "NaiveDateTime"))
    }

    fn null_value() -> Self {
        NaiveDateTime::default()
    }
}

impl FromCalendarValue for NaiveDate {
    fn from_calendar_value(cell: &CellRef<'_>, calendar: &Calendar) -> Result<Self> {
        temporal::calendar_date(cell.value, calendar, cell.default_zone)
            .ok_or_else(|| mismatch(cell, "NaiveDate"))
    }

    fn null_value() -> Self {
        NaiveDate::default()
    }
}

impl FromCalendarValue for NaiveTime {
    fn from_calendar_value(cell: &CellRef<'_>, calendar: &Calendar) -> Result<Self> {
        temporal::calendar_time(cell.value, calendar, cell.default_zone)
            .ok_or_else(|| mismatch(cell, "NaiveTime"))
    }

    fn null_value() -> Self {
        NaiveTime::default()
    }
}

/// Expressed at the calendar's offset.
impl FromCalendarValue for DateTime<FixedOffset> {
    fn from_calendar_value(cell: &CellRef<'_>, calendar: &Calendar) -> Result<Self> {
        temporal::calendar_instant(cell.value, calendar)
            .map(|dt| dt.with_timezone(&calendar.zone()))
            .ok_or_else(|| mismatch(cell, "DateTime<FixedOffset>"))
    }

    fn null_value() -> Self {
        DateTime::<FixedOffset>::default()
    }
}

impl FromCalendarValue for DateTime<Utc> {
    fn from_calendar_value(cell: &CellRef<'_>, calendar: &Calendar) -> Result<Self> {
        temporal::calendar_instant(cell.value, calendar)
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| mismatch(cell, "DateTime<Utc>"))
    }

    fn null_value() -> Self {
        DateTime::<Utc>::default()
    }
}

impl<T: FromCalendarValue> FromCalendarValue for Option<T> {
    fn from_calendar_value(cell: &CellRef<'_>, calendar: &Calendar) -> Result<Self> {
        T::from_calendar_value(cell, calendar).map(Some)
    }

    fn null_value() -> Self {
        None
    }
}
