//! Native cell to [`Value`] conversion.

use bytes::Bytes;

use super::column::NativeType;
use super::date::{decode_date, decode_timestamp, decode_timestamp_tz};
use super::number::decode_number;
use super::NativeCell;
use crate::error::{Error, Result};
use crate::types::{LobValue, Value};

/// Widest NUMBER precision whose integers always fit in an `i64`.
const MAX_INT_PRECISION: i8 = 18;

pub(crate) fn decode_cell(native_type: &NativeType, cell: &NativeCell) -> Result<Value> {
    match cell {
        NativeCell::Null => Ok(Value::Null),
        NativeCell::Data(data) => decode_data(native_type, data),
        NativeCell::Lob {
            locator,
            prefetched,
        } => {
            if !native_type.is_lob() {
                return Err(Error::protocol(format!(
                    "LOB locator received for {} column",
                    native_type
                )));
            }
            let data = prefetched
                .as_ref()
                .map(|d| lob_data(native_type, d))
                .transpose()?;
            let lob = LobValue {
                locator: Some(locator.clone()),
                data,
            };
            match native_type {
                NativeType::Blob => Ok(Value::Blob(lob)),
                _ => Ok(Value::Clob(lob)),
            }
        }
    }
}

fn decode_data(native_type: &NativeType, data: &Bytes) -> Result<Value> {
    match native_type {
        NativeType::Varchar2 { .. } | NativeType::Char { .. } | NativeType::Long => {
            Ok(Value::Text(utf8(data)?))
        }
        NativeType::Number { precision, scale } => {
            let text = decode_number(data)?;
            if *scale == 0 && (1..=MAX_INT_PRECISION).contains(precision) {
                parse_int(&text)
            } else {
                Ok(Value::Decimal(text))
            }
        }
        NativeType::BinaryInteger => parse_int(&decode_number(data)?),
        NativeType::Date => decode_date(data).map(Value::Timestamp),
        NativeType::Timestamp => decode_timestamp(data).map(Value::Timestamp),
        NativeType::TimestampTz => decode_timestamp_tz(data).map(Value::TimestampTz),
        NativeType::Raw { .. } | NativeType::LongRaw => Ok(Value::Bytes(data.clone())),
        NativeType::Clob | NativeType::Nclob => {
            Ok(Value::Clob(LobValue::inline(lob_data(native_type, data)?)))
        }
        NativeType::Blob => Ok(Value::Blob(LobValue::inline(data.clone()))),
    }
}

fn parse_int(text: &str) -> Result<Value> {
    text.parse::<i64>()
        .map(Value::Int)
        .map_err(|_| Error::protocol(format!("integer NUMBER out of range: {}", text)))
}

fn utf8(data: &[u8]) -> Result<String> {
    String::from_utf8(data.to_vec())
        .map_err(|e| Error::protocol(format!("invalid UTF-8 in character data: {}", e)))
}

/// Character LOB data travels as UTF-16BE; it is stored as UTF-8.
fn lob_data(native_type: &NativeType, data: &Bytes) -> Result<Bytes> {
    if !matches!(native_type, NativeType::Clob | NativeType::Nclob) {
        return Ok(data.clone());
    }
    if data.len() % 2 != 0 {
        return Err(Error::protocol(format!(
            "CLOB data has odd length {}",
            data.len()
        )));
    }
    let units = data
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map(Bytes::from)
        .map_err(|e| Error::protocol(format!("invalid UTF-16 in CLOB data: {}", e)))
}
