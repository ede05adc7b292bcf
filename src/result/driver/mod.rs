//! Result backed by a live statement.
//!
//! A [`RowSource`] is the narrow interface to the backend: it describes the
//! columns, hands out batches of native rows and reads LOBs by locator.
//! [`DriverQueryResult`] buffers the batches, decodes each cell the first
//! time it is read and releases the source as soon as it is no longer
//! needed.

mod column;
mod date;
mod decode;
mod number;

pub use column::{NativeColumn, NativeType};

use bytes::Bytes;
use std::collections::VecDeque;
use tracing::{debug, warn};

use self::decode::decode_cell;
use super::{stream_data, StreamData};
use crate::cursor::{CellRef, CursorState, Position, QueryResult};
use crate::error::{Error, Result};
use crate::options::ResultOptions;
use crate::types::{LobLocator, LobReader, LobStream, ResultMetadata, StreamKind, Value};

/// One cell as received from the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeCell {
    Null,
    /// Encoded scalar data.
    Data(Bytes),
    /// LOB locator, with data when the backend prefetched it.
    Lob {
        locator: LobLocator,
        prefetched: Option<Bytes>,
    },
}

/// Cells of one row, in column order.
pub type NativeRow = Vec<NativeCell>;

/// Rows returned by one fetch round-trip.
#[derive(Debug, Clone, Default)]
pub struct FetchBatch {
    pub rows: Vec<NativeRow>,
    /// Whether the backend has more rows after this batch.
    pub more_rows: bool,
}

/// Backend statement handle feeding a [`DriverQueryResult`].
///
/// Calls may block on I/O.
pub trait RowSource {
    /// Columns of the result, in order.
    fn describe(&self) -> &[NativeColumn];

    /// Fetch up to `max_rows` rows.
    fn fetch(&mut self, max_rows: u32) -> Result<FetchBatch>;

    /// Open a reader over a LOB of the current result.
    ///
    /// Character LOBs are read as UTF-8.
    fn open_lob(&mut self, locator: &LobLocator) -> Result<Box<dyn LobReader>>;

    /// Release the statement. Called at most once.
    fn close(&mut self) -> Result<()>;
}

/// Forward-only cursor over a [`RowSource`].
///
/// # Lifecycle
///
/// 1. Created over an executed statement, optionally with the rows that came
///    back with the execute call
/// 2. Iterated via `advance()`; rows are fetched `fetch_size` at a time
/// 3. The source is closed when the rows run out, on `close()`, or on drop
///
/// A backend error during `advance` aborts the cursor: the source is closed
/// and every later call fails with a state error.
pub struct DriverQueryResult<S: RowSource> {
    source: S,
    source_open: bool,
    metadata: ResultMetadata,
    native_types: Vec<NativeType>,
    options: ResultOptions,
    /// Buffered rows from prefetch/fetch.
    buffer: VecDeque<NativeRow>,
    /// Whether the backend has more rows.
    more_rows: bool,
    rows_fetched: u64,
    current: NativeRow,
    /// Decoded cells of the current row, filled on first read.
    decoded: Vec<Option<Value>>,
    state: CursorState,
}

impl<S: RowSource> DriverQueryResult<S> {
    pub fn new(source: S) -> Self {
        let columns = source.describe();
        let metadata = ResultMetadata::new(columns.iter().map(NativeColumn::describe).collect());
        let native_types = columns.iter().map(|c| c.native_type.clone()).collect();
        Self {
            source,
            source_open: true,
            metadata,
            native_types,
            options: ResultOptions::default(),
            buffer: VecDeque::new(),
            more_rows: true,
            rows_fetched: 0,
            current: Vec::new(),
            decoded: Vec::new(),
            state: CursorState::new(),
        }
    }

    pub fn with_options(mut self, options: ResultOptions) -> Self {
        self.options = options;
        self
    }

    /// Seed the buffer with rows returned by the execute round-trip.
    pub fn with_prefetch(mut self, batch: FetchBatch) -> Result<Self> {
        self.accept(batch)?;
        Ok(self)
    }

    /// Total rows received from the backend so far.
    pub fn rows_fetched(&self) -> u64 {
        self.rows_fetched
    }

    /// Rows received but not yet advanced onto.
    pub fn buffered_count(&self) -> usize {
        self.buffer.len()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn accept(&mut self, batch: FetchBatch) -> Result<()> {
        let expected = self.metadata.column_count();
        for (i, row) in batch.rows.iter().enumerate() {
            if row.len() != expected {
                return Err(Error::InvalidRow {
                    row: (self.rows_fetched as usize) + i + 1,
                    expected,
                    actual: row.len(),
                });
            }
        }
        self.rows_fetched += batch.rows.len() as u64;
        self.more_rows = batch.more_rows;
        self.buffer.extend(batch.rows);
        Ok(())
    }

    fn do_fetch(&mut self) -> Result<()> {
        let batch = self.source.fetch(self.options.fetch_size)?;
        let received = batch.rows.len();
        self.accept(batch)?;
        debug!(
            rows = received,
            more_rows = self.more_rows,
            total = self.rows_fetched,
            "fetched rows"
        );
        Ok(())
    }

    fn next_row(&mut self) -> Result<Option<NativeRow>> {
        if self.buffer.is_empty() && self.more_rows && self.source_open {
            self.do_fetch()?;
        }
        Ok(self.buffer.pop_front())
    }

    fn release_source(&mut self) -> Result<()> {
        if !self.source_open {
            return Ok(());
        }
        self.source_open = false;
        self.more_rows = false;
        self.source.close()
    }

    fn abort(&mut self) {
        self.state.release();
        self.buffer.clear();
        self.current.clear();
        self.decoded.clear();
        if let Err(e) = self.release_source() {
            warn!(error = %e, "failed to close row source after backend error");
        }
    }
}

/// Decoded value of a cell of the current row, decoding on first access.
fn decoded_value<'a>(
    decoded: &'a mut [Option<Value>],
    native_types: &[NativeType],
    row: &[NativeCell],
    offset: usize,
) -> Result<&'a Value> {
    let value = match decoded[offset].take() {
        Some(value) => value,
        None => decode_cell(&native_types[offset], &row[offset])?,
    };
    Ok(decoded[offset].insert(value))
}

impl<S: RowSource> QueryResult for DriverQueryResult<S> {
    fn advance(&mut self) -> Result<bool> {
        if !self.state.begin_advance()? {
            return Ok(false);
        }
        match self.next_row() {
            Ok(Some(row)) => {
                self.decoded.clear();
                self.decoded.resize(row.len(), None);
                self.current = row;
                Ok(self.state.finish_advance(true))
            }
            Ok(None) => {
                self.current.clear();
                self.decoded.clear();
                self.state.finish_advance(false);
                self.release_source()?;
                Ok(false)
            }
            Err(e) => {
                self.abort();
                Err(e)
            }
        }
    }

    fn metadata(&self) -> &ResultMetadata {
        &self.metadata
    }

    fn options(&self) -> &ResultOptions {
        &self.options
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
        let value = decoded_value(&mut self.decoded, &self.native_types, &self.current, offset)?;
        Ok(CellRef {
            value,
            column: &self.metadata.columns()[offset],
            default_zone: self.options.default_zone,
        })
    }

    fn record_read(&mut self, is_null: bool) {
        self.state.record_value(is_null);
    }

    fn get_input_stream(&mut self, column_index: usize, kind: StreamKind) -> Result<LobStream> {
        self.state.require_row("open a stream")?;
        let offset = self.metadata.check_index(column_index)?;
        let value = decoded_value(&mut self.decoded, &self.native_types, &self.current, offset)?;
        let is_null = value.is_null();
        let stream = match stream_data(&self.metadata.columns()[offset], value, kind)? {
            StreamData::Inline(bytes) => {
                LobStream::buffered(column_index, kind, self.state.ticket(), bytes)
            }
            StreamData::Locator(locator) => {
                let reader = self.source.open_lob(locator)?;
                let chunk_size = match locator.chunk_size {
                    0 => self.options.lob_chunk_size,
                    n => n,
                };
                LobStream::chunked(
                    column_index,
                    kind,
                    self.state.ticket(),
                    reader,
                    locator.size,
                    chunk_size,
                )
            }
        };
        self.state.record_value(is_null);
        Ok(stream)
    }

    fn was_null(&self) -> Result<bool> {
        self.state.was_null()
    }

    fn close(&mut self) -> Result<()> {
        if !self.state.release() {
            return Ok(());
        }
        debug!(rows_fetched = self.rows_fetched, "closing driver query result");
        self.buffer.clear();
        self.current.clear();
        self.decoded.clear();
        self.release_source()
    }
}

impl<S: RowSource> Drop for DriverQueryResult<S> {
    fn drop(&mut self) {
        self.state.release();
        if let Err(e) = self.release_source() {
            warn!(error = %e, "failed to close row source on drop");
        }
    }
}

impl<S: RowSource> std::fmt::Debug for DriverQueryResult<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverQueryResult")
            .field("columns", &self.metadata.column_count())
            .field("position", &self.state.position())
            .field("rows_fetched", &self.rows_fetched)
            .field("buffered", &self.buffer.len())
            .field("more_rows", &self.more_rows)
            .field("source_open", &self.source_open)
            .finish()
    }
}
