//! Result over rows held in memory.

use std::collections::VecDeque;
use tracing::debug;

use crate::cursor::{CellRef, CursorState, Position, QueryResult, QueryResultExt};
use crate::error::{Error, Result};
use crate::options::ResultOptions;
use crate::types::{LobStream, ResultMetadata, StreamKind, Value};

use super::{stream_data, StreamData};

/// A pre-materialized row set. Never blocks.
///
/// # Example
///
/// ```
/// use shard_query_result::{
///     ColumnDescriptor, MemoryQueryResult, QueryResult, ResultMetadata, SqlType, Value,
/// };
///
/// let metadata = ResultMetadata::new(vec![ColumnDescriptor::new("n", SqlType::BigInt)]);
/// let mut result = MemoryQueryResult::new(metadata, vec![vec![Value::from(7i64)]]).unwrap();
/// assert_eq!(result.remaining(), 1);
/// assert!(result.advance().unwrap());
/// assert!(!result.advance().unwrap());
/// ```
#[derive(Debug)]
pub struct MemoryQueryResult {
    metadata: ResultMetadata,
    options: ResultOptions,
    rows: VecDeque<Vec<Value>>,
    current: Vec<Value>,
    state: CursorState,
}

impl MemoryQueryResult {
    /// Create a result over `rows`.
    ///
    /// Fails with `InvalidRow` if a row's width differs from the column count.
    pub fn new(metadata: ResultMetadata, rows: Vec<Vec<Value>>) -> Result<Self> {
        let expected = metadata.column_count();
        if let Some((row, values)) = rows
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != expected)
        {
            return Err(Error::InvalidRow {
                row: row + 1,
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            metadata,
            options: ResultOptions::default(),
            rows: rows.into(),
            current: Vec::new(),
            state: CursorState::new(),
        })
    }

    pub fn with_options(mut self, options: ResultOptions) -> Self {
        self.options = options;
        self
    }

    /// Drain `source` from its current position into memory.
    ///
    /// LOBs are read in full, so the new result no longer depends on the
    /// source's backend. Metadata and options are copied.
    pub fn load<Q: QueryResult + ?Sized>(source: &mut Q) -> Result<Self> {
        let mut rows = VecDeque::new();
        while source.advance()? {
            rows.push_back(source.materialize_row()?);
        }
        debug!(rows = rows.len(), "loaded query result into memory");
        Ok(Self {
            metadata: source.metadata().clone(),
            options: source.options().clone(),
            rows,
            current: Vec::new(),
            state: CursorState::new(),
        })
    }

    /// Rows not yet advanced onto.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl QueryResult for MemoryQueryResult {
    fn advance(&mut self) -> Result<bool> {
        if !self.state.begin_advance()? {
            return Ok(false);
        }
        let next = self.rows.pop_front();
        let found = next.is_some();
        self.current = next.unwrap_or_default();
        Ok(self.state.finish_advance(found))
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
        let value = &self.current[offset];
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
        let value = &self.current[offset];
        let data = stream_data(&self.metadata.columns()[offset], value, kind)?;
        let is_null = value.is_null();
        match data {
            StreamData::Inline(bytes) => {
                self.state.record_value(is_null);
                Ok(LobStream::buffered(column_index, kind, self.state.ticket(), bytes))
            }
            StreamData::Locator(_) => Err(Error::data_access(format!(
                "LOB in column {} has no backend to read it from",
                column_index
            ))),
        }
    }

    fn was_null(&self) -> Result<bool> {
        self.state.was_null()
    }

    fn close(&mut self) -> Result<()> {
        if self.state.release() {
            self.rows.clear();
            self.current.clear();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::{ColumnDescriptor, LobValue, SqlType};
    use bytes::Bytes;
    use std::io::Read;

    fn make_test_result() -> MemoryQueryResult {
        let metadata = ResultMetadata::new(vec![
            ColumnDescriptor::new("id", SqlType::Integer),
            ColumnDescriptor::new("body", SqlType::Clob),
        ]);
        let rows = vec![
            vec![Value::from(1), Value::Clob(LobValue::inline(Bytes::from("first")))],
            vec![Value::from(2), Value::Null],
        ];
        MemoryQueryResult::new(metadata, rows).unwrap()
    }

    #[test]
    fn test_row_width_validated() {
        let metadata = ResultMetadata::new(vec![ColumnDescriptor::new("id", SqlType::Integer)]);
        let err = MemoryQueryResult::new(metadata, vec![vec![Value::from(1)], vec![]]).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidRow {
                row: 2,
                expected: 1,
                actual: 0
            }
        ));
    }

    #[test]
    fn test_stream_over_inline_clob() {
        let mut result = make_test_result();
        assert!(result.advance().unwrap());
        let mut text = String::new();
        result
            .get_input_stream(2, StreamKind::Unicode)
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "first");
        assert!(!result.was_null().unwrap());

        assert!(result.advance().unwrap());
        let stream = result.get_input_stream(2, StreamKind::Ascii).unwrap();
        assert!(result.was_null().unwrap());
        assert!(stream.read_to_bytes().unwrap().is_empty());
    }

    #[test]
    fn test_close_keeps_metadata() {
        let mut result = make_test_result();
        result.advance().unwrap();
        result.close().unwrap();
        result.close().unwrap();
        assert!(result.is_closed());
        assert_eq!(result.column_count(), 2);
        assert_eq!(result.column_name(2).unwrap(), "body");
        assert_eq!(result.advance().unwrap_err().kind(), ErrorKind::State);
        assert_eq!(result.get_cell(1).unwrap_err().kind(), ErrorKind::State);
    }

    #[test]
    fn test_load_copies_rows() {
        let mut source = make_test_result();
        source.advance().unwrap();
        let mut loaded = MemoryQueryResult::load(&mut source).unwrap();
        assert_eq!(loaded.remaining(), 1);
        assert!(loaded.advance().unwrap());
        assert_eq!(loaded.row_values().unwrap(), vec![Value::Int(2), Value::Null]);
        assert!(loaded.was_null().unwrap());
    }

    #[test]
    fn test_failed_conversion_keeps_null_flag() {
        let metadata = ResultMetadata::new(vec![
            ColumnDescriptor::new("big", SqlType::Integer),
            ColumnDescriptor::new("note", SqlType::Varchar),
        ]);
        let mut result =
            MemoryQueryResult::new(metadata, vec![vec![Value::from(300), Value::Null]]).unwrap();
        assert!(result.advance().unwrap());

        assert_eq!(result.get_value::<i32>(2).unwrap(), 0);
        assert!(result.was_null().unwrap());
        assert_eq!(result.get_value::<i8>(1).unwrap_err().kind(), ErrorKind::Conversion);
        assert!(result.was_null().unwrap());

        assert_eq!(result.get_value::<i64>(1).unwrap(), 300);
        assert!(!result.was_null().unwrap());
        assert!(result.get_value::<i8>(1).is_err());
        assert!(!result.was_null().unwrap());
    }

    #[test]
    fn test_borrowing_a_cell_leaves_null_flag() {
        let mut result = make_test_result();
        assert!(result.advance().unwrap());
        assert!(result.get_cell(2).is_ok());
        assert!(matches!(result.was_null(), Err(Error::NoValueRead)));
    }
}
