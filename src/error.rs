//! Error types for query result cursors.
//!
//! Every failure a cursor can report belongs to one of five kinds, see
//! [`ErrorKind`]. Concrete variants carry the details.

use std::io;
use thiserror::Error;

use crate::cursor::Position;
use crate::types::{SqlType, StreamKind};

/// Result type alias for cursor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Category of a cursor failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Backend I/O or protocol failure.
    DataAccess,
    /// Operation not allowed in the current cursor state.
    State,
    /// Column index or label outside the result shape.
    Range,
    /// Value cannot be represented in the requested target.
    Conversion,
    /// Large-object stream used after its row or cursor went away.
    ResourceExpired,
}

/// Why a large-object stream is no longer readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiredReason {
    /// The owning cursor advanced past the stream's row.
    RowAdvanced,
    /// The owning cursor was closed or dropped.
    CursorReleased,
}

impl std::fmt::Display for ExpiredReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpiredReason::RowAdvanced => write!(f, "cursor advanced past its row"),
            ExpiredReason::CursorReleased => write!(f, "cursor was released"),
        }
    }
}

/// Error type for cursor operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while talking to a backend.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Backend failure without a vendor code.
    #[error("Data access error: {message}")]
    DataAccess { message: String },

    /// Backend failure carrying a vendor error code.
    #[error("Backend error {code}: {message}")]
    Backend { code: u32, message: String },

    /// Malformed native cell or row data.
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// Native type number the driver adapter cannot decode.
    #[error("Unsupported native data type: {type_num}")]
    UnsupportedType { type_num: u8 },

    /// Row shape does not match the result's column count.
    #[error("Row {row} has {actual} values, expected {expected}")]
    InvalidRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Operation requires a different cursor position.
    #[error("Cannot {operation} while cursor is {position}")]
    InvalidState {
        operation: &'static str,
        position: Position,
    },

    /// Cursor was closed or abandoned.
    #[error("Cannot {operation}: cursor is closed")]
    CursorClosed { operation: &'static str },

    /// `was_null` queried before any value was read on the current row.
    #[error("No value has been read on the current row")]
    NoValueRead,

    /// Column index out of bounds.
    #[error("Column index {index} out of bounds (columns: {count})")]
    ColumnIndexOutOfBounds { index: usize, count: usize },

    /// Column label not found.
    #[error("Column not found: {label}")]
    ColumnNotFound { label: String },

    /// Type conversion error.
    #[error("Type conversion error: {message}")]
    TypeConversion { message: String },

    /// Type code outside the shared SQL type vocabulary.
    #[error("Unknown SQL type code: {code}")]
    UnknownSqlType { code: i32 },

    /// Stream type tag other than Ascii, Unicode or Binary.
    #[error("Unsupported stream type: {tag}")]
    UnsupportedStreamKind { tag: String },

    /// Stream kind incompatible with the column's declared type.
    #[error("Column {column} of type {declared} cannot be read as a {requested} stream")]
    StreamTypeMismatch {
        column: usize,
        declared: SqlType,
        requested: StreamKind,
    },

    /// Large-object stream read outside its validity window.
    #[error("Stream over column {column} expired: {reason}")]
    ResourceExpired {
        column: usize,
        reason: ExpiredReason,
    },
}

impl Error {
    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a data access error.
    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess {
            message: message.into(),
        }
    }

    /// Create a type conversion error.
    pub fn type_conversion(message: impl Into<String>) -> Self {
        Self::TypeConversion {
            message: message.into(),
        }
    }

    /// The failure category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_)
            | Error::DataAccess { .. }
            | Error::Backend { .. }
            | Error::Protocol { .. }
            | Error::UnsupportedType { .. }
            | Error::InvalidRow { .. } => ErrorKind::DataAccess,
            Error::InvalidState { .. } | Error::CursorClosed { .. } | Error::NoValueRead => {
                ErrorKind::State
            }
            Error::ColumnIndexOutOfBounds { .. } | Error::ColumnNotFound { .. } => ErrorKind::Range,
            Error::TypeConversion { .. }
            | Error::UnknownSqlType { .. }
            | Error::UnsupportedStreamKind { .. }
            | Error::StreamTypeMismatch { .. } => ErrorKind::Conversion,
            Error::ResourceExpired { .. } => ErrorKind::ResourceExpired,
        }
    }

    /// Recover a crate error that was carried through `std::io::Read`.
    pub fn from_io(err: io::Error) -> Self {
        if err.get_ref().is_some_and(|inner| inner.is::<Error>()) {
            if let Some(inner) = err.into_inner() {
                if let Ok(err) = inner.downcast::<Error>() {
                    return *err;
                }
                return Error::data_access("stream failed with an unrecognized error");
            }
            return Error::data_access("stream failed without error details");
        }
        Error::Io(err)
    }

    pub(crate) fn into_io(self) -> io::Error {
        match self {
            Error::Io(err) => err,
            other => io::Error::other(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(Error::NoValueRead.kind(), ErrorKind::State);
        assert_eq!(
            Error::ColumnIndexOutOfBounds { index: 0, count: 3 }.kind(),
            ErrorKind::Range
        );
        assert_eq!(
            Error::type_conversion("300 does not fit in i8").kind(),
            ErrorKind::Conversion
        );
        assert_eq!(
            Error::Backend {
                code: 1555,
                message: "snapshot too old".into()
            }
            .kind(),
            ErrorKind::DataAccess
        );
    }

    #[test]
    fn test_io_round_trip_keeps_variant() {
        let err = Error::ResourceExpired {
            column: 2,
            reason: ExpiredReason::RowAdvanced,
        };
        let back = Error::from_io(err.into_io());
        assert!(matches!(
            back,
            Error::ResourceExpired {
                column: 2,
                reason: ExpiredReason::RowAdvanced
            }
        ));
    }

    #[test]
    fn test_plain_io_error_stays_io() {
        let err = io::Error::new(io::ErrorKind::UnexpectedEof, "short read");
        let back = Error::from_io(err);
        assert!(matches!(back, Error::Io(_)));
        assert_eq!(back.kind(), ErrorKind::DataAccess);
    }

    #[test]
    fn test_messages() {
        let err = Error::InvalidState {
            operation: "read a value",
            position: Position::BeforeFirst,
        };
        assert_eq!(
            err.to_string(),
            "Cannot read a value while cursor is before the first row"
        );
    }
}
