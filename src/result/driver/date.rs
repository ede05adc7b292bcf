//! Oracle DATE and TIMESTAMP decoders.
//!
//! The first 7 bytes are shared by every format:
//! - byte 0: century + 100
//! - byte 1: year in century + 100
//! - byte 2: month (1-12)
//! - byte 3: day (1-31)
//! - byte 4: hour + 1
//! - byte 5: minute + 1
//! - byte 6: second + 1
//!
//! TIMESTAMP adds 4 bytes of big-endian nanoseconds. TIMESTAMP WITH TIME
//! ZONE stores the date and time in UTC and adds the zone in bytes 11
//! (hour + 20) and 12 (minute + 60).

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

use crate::error::{Error, Result};

const TZ_HOUR_OFFSET: i32 = 20;
const TZ_MINUTE_OFFSET: i32 = 60;
/// Set in the zone hour byte when the zone is a named region.
const TZ_REGION_FLAG: u8 = 0x80;

fn field(data: &[u8], index: usize, bias: i32, name: &str, max: i32) -> Result<u32> {
    let value = data[index] as i32 - bias;
    if !(0..=max).contains(&value) {
        return Err(Error::protocol(format!("Invalid {}: {}", name, value)));
    }
    Ok(value as u32)
}

fn decode_datetime(data: &[u8], nanos: u32) -> Result<NaiveDateTime> {
    let year = (data[0] as i32 - 100) * 100 + (data[1] as i32 - 100);
    let month = data[2] as u32;
    let day = data[3] as u32;
    let hour = field(data, 4, 1, "hour", 23)?;
    let minute = field(data, 5, 1, "minute", 59)?;
    let second = field(data, 6, 1, "second", 59)?;

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        Error::protocol(format!(
            "Invalid DATE: year={}, month={}, day={}",
            year, month, day
        ))
    })?;
    let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
        .ok_or_else(|| Error::protocol(format!("Invalid fractional seconds: {}", nanos)))?;
    Ok(date.and_time(time))
}

fn decode_nanos(data: &[u8]) -> Result<u32> {
    let nanos = u32::from_be_bytes([data[7], data[8], data[9], data[10]]);
    if nanos >= 1_000_000_000 {
        return Err(Error::protocol(format!("Invalid fractional seconds: {}", nanos)));
    }
    Ok(nanos)
}

/// Decode a 7-byte DATE.
pub(crate) fn decode_date(data: &[u8]) -> Result<NaiveDateTime> {
    if data.len() != 7 {
        return Err(Error::protocol(format!(
            "DATE value must be exactly 7 bytes, got {}",
            data.len()
        )));
    }
    decode_datetime(data, 0)
}

/// Decode a TIMESTAMP. Servers drop the fraction when it is zero, so both
/// 7 and 11 bytes are valid.
pub(crate) fn decode_timestamp(data: &[u8]) -> Result<NaiveDateTime> {
    match data.len() {
        7 => decode_datetime(data, 0),
        11 => decode_datetime(data, decode_nanos(data)?),
        n => Err(Error::protocol(format!(
            "TIMESTAMP value must be 7 or 11 bytes, got {}",
            n
        ))),
    }
}

/// Decode a 13-byte TIMESTAMP WITH TIME ZONE at its stored offset.
pub(crate) fn decode_timestamp_tz(data: &[u8]) -> Result<DateTime<FixedOffset>> {
    if data.len() != 13 {
        return Err(Error::protocol(format!(
            "TIMESTAMP WITH TIME ZONE value must be 13 bytes, got {}",
            data.len()
        )));
    }
    if data[11] & TZ_REGION_FLAG != 0 {
        return Err(Error::protocol(
            "TIMESTAMP WITH TIME ZONE with a named region is not supported",
        ));
    }
    let utc = decode_datetime(data, decode_nanos(data)?)?;
    let offset_minutes =
        (data[11] as i32 - TZ_HOUR_OFFSET) * 60 + (data[12] as i32 - TZ_MINUTE_OFFSET);
    let zone = FixedOffset::east_opt(offset_minutes * 60)
        .ok_or_else(|| Error::protocol(format!("Invalid zone offset: {} minutes", offset_minutes)))?;
    Ok(zone.from_utc_datetime(&utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_date() {
        let ts = decode_date(&[0x78, 0x7c, 0x0a, 0x15, 0x0d, 0x25, 0x06]).unwrap();
        assert_eq!(ts.to_string(), "2024-10-21 12:36:05");
    }

    #[test]
    fn test_decode_date_midnight() {
        let ts = decode_date(&[0x78, 0x64, 0x01, 0x01, 0x01, 0x01, 0x01]).unwrap();
        assert_eq!(ts.to_string(), "2000-01-01 00:00:00");
    }

    #[test]
    fn test_decode_date_rejects_bad_fields() {
        assert!(decode_date(&[0x78, 0x7c, 0x0d, 0x15, 0x0d, 0x25, 0x06]).is_err());
        assert!(decode_date(&[0x78, 0x7c, 0x02, 0x1e, 0x0d, 0x25, 0x06]).is_err());
        // Zero hour byte would underflow.
        assert!(decode_date(&[0x78, 0x7c, 0x0a, 0x15, 0x00, 0x25, 0x06]).is_err());
        assert!(decode_date(&[0x78, 0x7c, 0x0a]).is_err());
    }

    #[test]
    fn test_decode_timestamp_fraction() {
        let mut data = vec![0x78, 0x7c, 0x0a, 0x15, 0x0d, 0x25, 0x06];
        data.extend_from_slice(&123_456_000u32.to_be_bytes());
        let ts = decode_timestamp(&data).unwrap();
        assert_eq!(ts.to_string(), "2024-10-21 12:36:05.123456");
        assert!(decode_timestamp(&data[..7]).is_ok());
        assert!(decode_timestamp(&data[..9]).is_err());
    }

    #[test]
    fn test_decode_timestamp_tz() {
        let mut data = vec![0x78, 0x7c, 0x0a, 0x15, 0x0d, 0x25, 0x06];
        data.extend_from_slice(&0u32.to_be_bytes());
        // +09:30
        data.extend_from_slice(&[20 + 9, 60 + 30]);
        let dt = decode_timestamp_tz(&data).unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 9 * 3600 + 1800);
        assert_eq!(dt.naive_utc().to_string(), "2024-10-21 12:36:05");
        assert_eq!(dt.naive_local().to_string(), "2024-10-21 22:06:05");

        data[11] |= TZ_REGION_FLAG;
        assert!(decode_timestamp_tz(&data).is_err());
    }
}
