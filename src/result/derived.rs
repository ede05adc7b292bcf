//! Result that decorates another result.
//!
//! Values come straight from the inner result's decoded cells; only the row
//! window and the column view differ.

use tracing::warn;

use crate::cursor::{CellRef, CursorState, Position, QueryResult};
use crate::error::{Error, Result};
use crate::options::ResultOptions;
use crate::types::{LobStream, ResultMetadata, StreamKind};

/// A row window and column view over another [`QueryResult`].
///
/// Configure it with the builder methods before the first `advance`.
///
/// # Example
///
/// ```
/// use shard_query_result::{
///     ColumnDescriptor, DerivedQueryResult, MemoryQueryResult, QueryResult, QueryResultExt,
///     ResultMetadata, SqlType, Value,
/// };
///
/// # fn main() -> shard_query_result::Result<()> {
/// let metadata = ResultMetadata::new(vec![
///     ColumnDescriptor::new("id", SqlType::Integer),
///     ColumnDescriptor::new("name", SqlType::Varchar),
/// ]);
/// let rows = (1..=5)
///     .map(|i| vec![Value::from(i), Value::from(format!("row{}", i))])
///     .collect();
/// let inner = MemoryQueryResult::new(metadata, rows)?;
///
/// let mut page = DerivedQueryResult::new(inner)
///     .with_offset(1)
///     .with_limit(2)
///     .project(&[2])?
///     .with_label(1, "title")?;
///
/// assert_eq!(page.column_label(1)?, "title");
/// let mut titles = Vec::new();
/// while page.advance()? {
///     titles.push(page.get_value::<String>(1)?);
/// }
/// assert_eq!(titles, ["row2", "row3"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DerivedQueryResult<Q: QueryResult> {
    inner: Q,
    metadata: ResultMetadata,
    /// Inner column index for each exposed column.
    mapping: Vec<usize>,
    offset: u64,
    skipped: u64,
    limit: Option<u64>,
    emitted: u64,
    state: CursorState,
}

impl<Q: QueryResult> DerivedQueryResult<Q> {
    /// Wrap `inner`, exposing all of its rows and columns.
    pub fn new(inner: Q) -> Self {
        let metadata = inner.metadata().clone();
        let mapping = (1..=metadata.column_count()).collect();
        Self {
            inner,
            metadata,
            mapping,
            offset: 0,
            skipped: 0,
            limit: None,
            emitted: 0,
            state: CursorState::new(),
        }
    }

    /// Skip the first `offset` rows of the inner result.
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Stop after `limit` rows and close the inner result.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Keep only the given columns, in the given order. Indexes are 1-based
    /// and refer to the current view.
    pub fn project(mut self, column_indexes: &[usize]) -> Result<Self> {
        let metadata = self.metadata.project(column_indexes)?;
        self.mapping = column_indexes
            .iter()
            .map(|&i| self.mapping[i - 1])
            .collect();
        self.metadata = metadata;
        Ok(self)
    }

    /// Relabel a column of the current view.
    pub fn with_label(mut self, column_index: usize, label: impl Into<String>) -> Result<Self> {
        let offset = self.metadata.check_index(column_index)?;
        let mut columns = self.metadata.columns().to_vec();
        columns[offset].label = label.into();
        self.metadata = ResultMetadata::new(columns);
        Ok(self)
    }

    pub fn inner(&self) -> &Q {
        &self.inner
    }

    pub fn into_inner(self) -> Q {
        self.inner
    }

    fn step(&mut self) -> Result<bool> {
        if self.limit.is_some_and(|limit| self.emitted >= limit) {
            self.inner.close()?;
            return Ok(false);
        }
        while self.skipped < self.offset {
            if !self.inner.advance()? {
                return Ok(false);
            }
            self.skipped += 1;
        }
        if !self.inner.advance()? {
            return Ok(false);
        }
        self.emitted += 1;
        Ok(true)
    }
}

impl<Q: QueryResult> QueryResult for DerivedQueryResult<Q> {
    fn advance(&mut self) -> Result<bool> {
        if !self.state.begin_advance()? {
            return Ok(false);
        }
        match self.step() {
            Ok(found) => Ok(self.state.finish_advance(found)),
            Err(e) => {
                self.state.release();
                if let Err(close_err) = self.inner.close() {
                    warn!(error = %close_err, "failed to close inner result after error");
                }
                Err(e)
            }
        }
    }

    fn metadata(&self) -> &ResultMetadata {
        &self.metadata
    }

    fn options(&self) -> &ResultOptions {
        self.inner.options()
    }

    fn position(&self) -> Position {
        self.state.position()
    }

    fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    fn get_cell(&mut self, column_index: usize) -> Result<CellRef<'_>> {
        self.state.require_row("read a value")?;
        let offset = self.metadata.check_index(column_index)?;
        let cell = self.inner.get_cell(self.mapping[offset])?;
        Ok(CellRef {
            value: cell.value,
            column: &self.metadata.columns()[offset],
            default_zone: cell.default_zone,
        })
    }

    fn record_read(&mut self, is_null: bool) {
        self.state.record_value(is_null);
    }

    fn get_input_stream(&mut self, column_index: usize, kind: StreamKind) -> Result<LobStream> {
        self.state.require_row("open a stream")?;
        let offset = self.metadata.check_index(column_index)?;
        let column = &self.metadata.columns()[offset];
        if !column.sql_type.supports_stream(kind) {
            return Err(Error::StreamTypeMismatch {
                column: column_index,
                declared: column.sql_type,
                requested: kind,
            });
        }
        let stream = self.inner.get_input_stream(self.mapping[offset], kind)?;
        let is_null = self.inner.was_null()?;
        self.state.record_value(is_null);
        Ok(stream.bind(self.state.ticket()))
    }

    fn was_null(&self) -> Result<bool> {
        self.state.was_null()
    }

    fn close(&mut self) -> Result<()> {
        if !self.state.release() {
            return Ok(());
        }
        self.inner.close()
    }
}
