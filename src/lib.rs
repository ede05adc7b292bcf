//! Unified query result cursors for sharded query execution.
//!
//! Every shard of a distributed query produces its rows through one
//! polymorphic contract, [`QueryResult`]: a forward-only cursor with typed,
//! exact value decoding, calendar-aware temporal decoding, streamed access to
//! large objects and column metadata that stays valid for the cursor's whole
//! life. Merge, sort and aggregation layers consume any mix of backends
//! through it.
//!
//! Three result variants ship with the crate:
//! - [`MemoryQueryResult`] over rows held in memory
//! - [`DriverQueryResult`] over a live statement, through a [`RowSource`]
//! - [`DerivedQueryResult`] decorating another result
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use shard_query_result::{
//!     Calendar, ColumnDescriptor, MemoryQueryResult, QueryResult, QueryResultExt,
//!     ResultMetadata, Result, SqlType, Value,
//! };
//!
//! fn main() -> Result<()> {
//!     let metadata = ResultMetadata::new(vec![
//!         ColumnDescriptor::new("order_id", SqlType::BigInt).with_table("t_order"),
//!         ColumnDescriptor::new("created", SqlType::Timestamp).with_table("t_order"),
//!     ]);
//!     let created = NaiveDate::from_ymd_opt(2024, 1, 1)
//!         .and_then(|d| d.and_hms_opt(9, 0, 0))
//!         .map(Value::from)
//!         .unwrap_or(Value::Null);
//!     let mut result = MemoryQueryResult::new(metadata, vec![vec![Value::from(1001i64), created]])?;
//!
//!     let tokyo: Calendar = "+09:00".parse()?;
//!     while result.advance()? {
//!         let id: u64 = result.get_value(1)?;
//!         let created: chrono::DateTime<chrono::Utc> = result.get_calendar_value(2, &tokyo)?;
//!         println!("{} created at {}", id, created);
//!     }
//!     result.close()?;
//!     Ok(())
//! }
//! ```

pub mod cursor;
pub mod decode;
pub mod error;
pub mod options;
pub mod result;
pub mod stream;
pub mod types;

// Re-export main types
pub use cursor::{CellRef, CursorState, Position, QueryResult, QueryResultExt, RowTicket};
pub use decode::{FromCalendarValue, FromValue};
pub use error::{Error, ErrorKind, ExpiredReason, Result};
pub use options::ResultOptions;
pub use result::{
    DerivedQueryResult, DriverQueryResult, FetchBatch, MemoryQueryResult, NativeCell, NativeColumn,
    NativeRow, NativeType, RowSource,
};
pub use stream::QueryResultStreamExt;
pub use types::{
    Calendar, ColumnDescriptor, LobLocator, LobReader, LobStream, LobValue, ResultMetadata,
    SqlType, StreamKind, Value, SQL_TYPE_VOCABULARY_VERSION,
};
