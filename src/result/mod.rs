//! Result variants: one [`QueryResult`](crate::QueryResult) implementation
//! per kind of backend.
//!
//! - [`MemoryQueryResult`] iterates rows already held in memory.
//! - [`DriverQueryResult`] pulls rows from a live statement through a
//!   [`RowSource`], decoding native cells on demand.
//! - [`DerivedQueryResult`] decorates another result with offset, limit,
//!   projection and aliasing.

mod derived;
mod driver;
mod memory;

pub use derived::DerivedQueryResult;
pub use driver::{
    DriverQueryResult, FetchBatch, NativeCell, NativeColumn, NativeRow, NativeType, RowSource,
};
pub use memory::MemoryQueryResult;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::types::{ColumnDescriptor, LobLocator, StreamKind, Value};

/// Where the bytes of a stream come from.
pub(crate) enum StreamData<'a> {
    Inline(Bytes),
    Locator(&'a LobLocator),
}

/// Resolve the stream source of a decoded cell.
///
/// The declared column type is checked before the value, so a null cell in
/// an incompatible column still fails.
pub(crate) fn stream_data<'a>(
    column: &ColumnDescriptor,
    value: &'a Value,
    kind: StreamKind,
) -> Result<StreamData<'a>> {
    if !column.sql_type.supports_stream(kind) {
        return Err(Error::StreamTypeMismatch {
            column: column.position,
            declared: column.sql_type,
            requested: kind,
        });
    }
    let data = match value {
        Value::Null => StreamData::Inline(Bytes::new()),
        Value::Text(s) => StreamData::Inline(Bytes::copy_from_slice(s.as_bytes())),
        Value::Bytes(b) => StreamData::Inline(b.clone()),
        Value::Clob(lob) | Value::Blob(lob) => match (&lob.data, &lob.locator) {
            (Some(data), _) => StreamData::Inline(data.clone()),
            (None, Some(locator)) => StreamData::Locator(locator),
            (None, None) => StreamData::Inline(Bytes::new()),
        },
        other if kind != StreamKind::Binary => StreamData::Inline(other.to_string().into()),
        other => {
            return Err(Error::type_conversion(format!(
                "{} in column {} cannot be streamed as {}",
                other.kind_name(),
                column.position,
                kind
            )))
        }
    };
    Ok(data)
}
