//! Asynchronous row stream over a blocking cursor.
//!
//! Cursor calls may block on backend I/O, so the cursor is moved onto
//! Tokio's blocking pool and rows are handed over through a bounded channel.

use futures::stream::{self, Stream};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::cursor::{QueryResult, QueryResultExt};
use crate::error::Result;
use crate::types::Value;

/// Extension trait for converting a [`QueryResult`] into a `Stream` of rows.
///
/// # Example
///
/// ```
/// use futures::stream::TryStreamExt;
/// use shard_query_result::{
///     ColumnDescriptor, MemoryQueryResult, QueryResultStreamExt, ResultMetadata, SqlType, Value,
/// };
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let metadata = ResultMetadata::new(vec![ColumnDescriptor::new("id", SqlType::Integer)]);
///     let rows = vec![vec![Value::from(1)], vec![Value::from(2)]];
///     let result = MemoryQueryResult::new(metadata, rows)?;
///
///     let rows: Vec<Vec<Value>> = result.into_row_stream().try_collect().await?;
///     assert_eq!(rows.len(), 2);
///     Ok(())
/// }
/// ```
pub trait QueryResultStreamExt: QueryResult + Sized {
    /// Convert this result into a stream of materialized rows.
    ///
    /// Must be called from within a Tokio runtime. At most
    /// `options().stream_buffer` rows are read ahead. The first error ends
    /// the stream. The result is closed once it is drained, after an error,
    /// or when the stream is dropped.
    fn into_row_stream(self) -> impl Stream<Item = Result<Vec<Value>>> + Send + 'static;
}

impl<Q: QueryResult + Send + 'static> QueryResultStreamExt for Q {
    fn into_row_stream(self) -> impl Stream<Item = Result<Vec<Value>>> + Send + 'static {
        let (tx, rx) = mpsc::channel(self.options().stream_buffer.max(1));
        tokio::task::spawn_blocking(move || pump(self, tx));

        stream::unfold(rx, |mut rx| async move {
            let item = rx.recv().await?;
            Some((item, rx))
        })
    }
}

/// Drive the cursor on a blocking thread.
fn pump<Q: QueryResult>(mut result: Q, tx: mpsc::Sender<Result<Vec<Value>>>) {
    loop {
        let item = match result.advance() {
            Ok(true) => result.materialize_row(),
            Ok(false) => break,
            Err(e) => Err(e),
        };
        let failed = item.is_err();
        if tx.blocking_send(item).is_err() {
            debug!("row stream dropped before the result was drained");
            break;
        }
        if failed {
            break;
        }
    }
    if let Err(e) = result.close() {
        warn!(error = %e, "failed to close query result behind row stream");
    }
}
