//! The cursor contract shared by every result variant.
//!
//! [`QueryResult`] is the object-safe trait producers implement, one
//! implementation per backend. [`QueryResultExt`] layers the typed decoding
//! operations on top of it and is available on every `QueryResult`,
//! including `Box<dyn QueryResult>`.
//!
//! [`CursorState`] is the iteration engine the variants embed: it owns the
//! position state machine, the last-read null flag and the row generation
//! that large-object streams are checked against.

use chrono::FixedOffset;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

use crate::decode::{FromCalendarValue, FromValue};
use crate::error::{Error, ExpiredReason, Result};
use crate::options::ResultOptions;
use crate::types::{Calendar, ColumnDescriptor, LobStream, LobValue, ResultMetadata, StreamKind, Value};

/// Position of a cursor relative to its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    /// No row has been fetched yet.
    #[default]
    BeforeFirst,
    /// A row is current.
    OnRow,
    /// All rows were consumed. Terminal.
    Exhausted,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::BeforeFirst => write!(f, "before the first row"),
            Position::OnRow => write!(f, "on a row"),
            Position::Exhausted => write!(f, "exhausted"),
        }
    }
}

const RELEASED: u64 = u64::MAX;

/// Counter bumped on every advance, poisoned on release.
#[derive(Debug, Clone, Default)]
pub(crate) struct RowGeneration(Arc<AtomicU64>);

impl RowGeneration {
    pub(crate) fn ticket(&self) -> RowTicket {
        RowTicket {
            generation: self.clone(),
            issued: self.0.load(Ordering::Acquire),
        }
    }

    pub(crate) fn bump(&self) {
        let _ = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |g| {
                (g < RELEASED - 1).then_some(g + 1)
            });
    }

    pub(crate) fn release(&self) {
        self.0.store(RELEASED, Ordering::Release);
    }
}

/// Proof of the row a stream was opened on.
#[derive(Debug, Clone)]
pub struct RowTicket {
    generation: RowGeneration,
    issued: u64,
}

impl RowTicket {
    pub(crate) fn check(&self) -> std::result::Result<(), ExpiredReason> {
        match self.generation.0.load(Ordering::Acquire) {
            RELEASED => Err(ExpiredReason::CursorReleased),
            current if current != self.issued => Err(ExpiredReason::RowAdvanced),
            _ => Ok(()),
        }
    }
}

/// Iteration state of one cursor.
#[derive(Debug, Default)]
pub struct CursorState {
    position: Position,
    last_was_null: Option<bool>,
    closed: bool,
    rows: u64,
    generation: RowGeneration,
}

impl CursorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of rows the cursor has stood on so far.
    pub fn row_number(&self) -> u64 {
        self.rows
    }

    /// Check that an advance may proceed.
    ///
    /// Returns `Ok(false)` when the cursor is already exhausted, in which case
    /// the caller must report `false` without touching its backend.
    pub fn begin_advance(&self) -> Result<bool> {
        if self.closed {
            return Err(Error::CursorClosed {
                operation: "advance",
            });
        }
        Ok(self.position != Position::Exhausted)
    }

    /// Record the outcome of an advance. Returns `found`.
    pub fn finish_advance(&mut self, found: bool) -> bool {
        self.generation.bump();
        self.last_was_null = None;
        if found {
            self.position = Position::OnRow;
            self.rows += 1;
        } else {
            self.position = Position::Exhausted;
        }
        trace!(row = self.rows, found, "cursor advanced");
        found
    }

    /// Fail unless the cursor is open and on a row.
    pub fn require_row(&self, operation: &'static str) -> Result<()> {
        if self.closed {
            return Err(Error::CursorClosed { operation });
        }
        if self.position != Position::OnRow {
            return Err(Error::InvalidState {
                operation,
                position: self.position,
            });
        }
        Ok(())
    }

    pub fn record_value(&mut self, is_null: bool) {
        self.last_was_null = Some(is_null);
    }

    pub fn was_null(&self) -> Result<bool> {
        self.require_row("check for null")?;
        self.last_was_null.ok_or(Error::NoValueRead)
    }

    /// Ticket for a stream opened on the current row.
    pub fn ticket(&self) -> RowTicket {
        self.generation.ticket()
    }

    /// Mark the cursor closed and expire its streams.
    ///
    /// Returns `false` if it was already closed.
    pub fn release(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        self.last_was_null = None;
        self.generation.release();
        true
    }
}

/// One cell of the current row together with its column.
#[derive(Debug, Clone, Copy)]
pub struct CellRef<'a> {
    pub value: &'a Value,
    pub column: &'a ColumnDescriptor,
    /// Process-default zone from the result's options.
    pub default_zone: FixedOffset,
}

/// Forward-only cursor over the rows of one result.
///
/// Column indexes are 1-based. Metadata accessors work in every state, even
/// after `close`. Value access requires the cursor to be on a row.
///
/// # Example
///
/// ```
/// use shard_query_result::{
///     ColumnDescriptor, MemoryQueryResult, QueryResult, QueryResultExt, ResultMetadata, SqlType,
///     Value,
/// };
///
/// # fn main() -> shard_query_result::Result<()> {
/// let metadata = ResultMetadata::new(vec![
///     ColumnDescriptor::new("id", SqlType::Integer),
///     ColumnDescriptor::new("note", SqlType::Varchar),
/// ]);
/// let rows = vec![vec![Value::from(1), Value::Null]];
/// let mut result = MemoryQueryResult::new(metadata, rows)?;
///
/// while result.advance()? {
///     let id: i32 = result.get_value(1)?;
///     let note: Option<String> = result.get_value(2)?;
///     assert_eq!((id, note), (1, None));
///     assert!(result.was_null()?);
/// }
/// # Ok(())
/// # }
/// ```
pub trait QueryResult {
    /// Move to the next row. Returns `false` once no rows remain, and on
    /// every call after that.
    fn advance(&mut self) -> Result<bool>;

    /// Column descriptors, fixed for the lifetime of the result.
    fn metadata(&self) -> &ResultMetadata;

    fn options(&self) -> &ResultOptions;

    fn position(&self) -> Position;

    fn is_closed(&self) -> bool;

    /// Borrow a cell of the current row. The null flag is left as it was.
    fn get_cell(&mut self, column_index: usize) -> Result<CellRef<'_>>;

    /// Record a completed read of the current row for [`was_null`](Self::was_null).
    fn record_read(&mut self, is_null: bool);

    /// Open a fresh stream over a large-object cell of the current row.
    ///
    /// A null cell yields an empty stream and sets the null flag.
    fn get_input_stream(&mut self, column_index: usize, kind: StreamKind) -> Result<LobStream>;

    /// Whether the last value read on the current row was null.
    fn was_null(&self) -> Result<bool>;

    /// Release backend resources. Idempotent.
    fn close(&mut self) -> Result<()>;

    fn column_count(&self) -> usize {
        self.metadata().column_count()
    }

    fn table_name(&self, column_index: usize) -> Result<&str> {
        Ok(&self.metadata().column(column_index)?.table_name)
    }

    fn column_name(&self, column_index: usize) -> Result<&str> {
        Ok(&self.metadata().column(column_index)?.name)
    }

    fn column_label(&self, column_index: usize) -> Result<&str> {
        Ok(&self.metadata().column(column_index)?.label)
    }

    /// Type code from the shared [`SqlType`](crate::SqlType) vocabulary.
    fn column_type(&self, column_index: usize) -> Result<i32> {
        Ok(self.metadata().column(column_index)?.type_code())
    }

    fn column_type_name(&self, column_index: usize) -> Result<&str> {
        Ok(&self.metadata().column(column_index)?.type_name)
    }

    fn column_length(&self, column_index: usize) -> Result<u32> {
        Ok(self.metadata().column(column_index)?.length)
    }

    fn decimals(&self, column_index: usize) -> Result<i32> {
        Ok(self.metadata().column(column_index)?.decimals)
    }

    fn is_signed(&self, column_index: usize) -> Result<bool> {
        Ok(self.metadata().column(column_index)?.signed)
    }

    fn is_nullable(&self, column_index: usize) -> Result<bool> {
        Ok(self.metadata().column(column_index)?.nullable)
    }

    fn is_auto_increment(&self, column_index: usize) -> Result<bool> {
        Ok(self.metadata().column(column_index)?.auto_increment)
    }

    /// 1-based index of the column with `label` (case-insensitive).
    fn find_column(&self, label: &str) -> Result<usize> {
        self.metadata().require_label(label)
    }
}

impl<Q: QueryResult + ?Sized> QueryResult for Box<Q> {
    fn advance(&mut self) -> Result<bool> {
        (**self).advance()
    }

    fn metadata(&self) -> &ResultMetadata {
        (**self).metadata()
    }

    fn options(&self) -> &ResultOptions {
        (**self).options()
    }

    fn position(&self) -> Position {
        (**self).position()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }

    fn get_cell(&mut self, column_index: usize) -> Result<CellRef<'_>> {
        (**self).get_cell(column_index)
    }

    fn record_read(&mut self, is_null: bool) {
        (**self).record_read(is_null)
    }

    fn get_input_stream(&mut self, column_index: usize, kind: StreamKind) -> Result<LobStream> {
        (**self).get_input_stream(column_index, kind)
    }

    fn was_null(&self) -> Result<bool> {
        (**self).was_null()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Typed value access for every [`QueryResult`].
pub trait QueryResultExt: QueryResult {
    /// Decode a cell of the current row into `T`.
    ///
    /// A null cell yields `T`'s null value (zero, empty, or `None` for
    /// `Option<T>`) and sets the null flag. A failed read leaves the flag
    /// untouched.
    fn get_value<T: FromValue>(&mut self, column_index: usize) -> Result<T> {
        let cell = self.get_cell(column_index)?;
        let is_null = cell.value.is_null();
        let value = if is_null {
            T::null_value()
        } else {
            T::from_value(&cell)?
        };
        self.record_read(is_null);
        Ok(value)
    }

    /// Decode a temporal cell, reading zone-less values as recorded in
    /// `calendar`'s zone.
    fn get_calendar_value<T: FromCalendarValue>(
        &mut self,
        column_index: usize,
        calendar: &Calendar,
    ) -> Result<T> {
        let cell = self.get_cell(column_index)?;
        let is_null = cell.value.is_null();
        let value = if is_null {
            T::null_value()
        } else {
            T::from_calendar_value(&cell, calendar)?
        };
        self.record_read(is_null);
        Ok(value)
    }

    fn get_value_by_label<T: FromValue>(&mut self, label: &str) -> Result<T> {
        let column_index = self.find_column(label)?;
        self.get_value(column_index)
    }

    /// Open a stream selected by its tag: `Ascii`, `Unicode` or `Binary`.
    fn get_input_stream_by_tag(&mut self, column_index: usize, tag: &str) -> Result<LobStream> {
        let kind = tag.parse::<StreamKind>()?;
        self.get_input_stream(column_index, kind)
    }

    /// Clone every cell of the current row.
    fn row_values(&mut self) -> Result<Vec<Value>> {
        let count = self.column_count();
        let values = (1..=count)
            .map(|i| self.get_cell(i).map(|cell| cell.value.clone()))
            .collect::<Result<Vec<_>>>()?;
        if let Some(last) = values.last() {
            self.record_read(last.is_null());
        }
        Ok(values)
    }

    /// Like [`row_values`](Self::row_values), but LOBs that only arrived as
    /// locators are read into memory so the row outlives the cursor.
    fn materialize_row(&mut self) -> Result<Vec<Value>> {
        let count = self.column_count();
        let mut values = Vec::with_capacity(count);
        for column_index in 1..=count {
            let value = self.get_cell(column_index)?.value.clone();
            let value = match value {
                Value::Clob(lob) if !lob.has_data() => {
                    let data = self
                        .get_input_stream(column_index, StreamKind::Unicode)?
                        .read_to_bytes()?;
                    Value::Clob(LobValue::inline(data))
                }
                Value::Blob(lob) if !lob.has_data() => {
                    let data = self
                        .get_input_stream(column_index, StreamKind::Binary)?
                        .read_to_bytes()?;
                    Value::Blob(LobValue::inline(data))
                }
                other => other,
            };
            values.push(value);
        }
        if let Some(last) = values.last() {
            self.record_read(last.is_null());
        }
        Ok(values)
    }
}

impl<Q: QueryResult + ?Sized> QueryResultExt for Q {}
