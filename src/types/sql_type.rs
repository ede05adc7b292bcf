//! Vendor-neutral SQL type vocabulary shared by all result variants.
//!
//! Codes follow the widely used JDBC `java.sql.Types` numbering so consumers
//! can dispatch on `type_code` without knowing which backend produced a
//! column. The vocabulary is closed and versioned by
//! [`SQL_TYPE_VOCABULARY_VERSION`].

use crate::error::{Error, Result};
use crate::types::StreamKind;

/// Version of the [`SqlType`] vocabulary. Bumped whenever a type is added.
pub const SQL_TYPE_VOCABULARY_VERSION: u16 = 1;

/// Column type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Bit,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Real,
    Double,
    Numeric,
    Decimal,
    Char,
    Varchar,
    LongVarchar,
    NChar,
    NVarchar,
    LongNVarchar,
    Date,
    Time,
    Timestamp,
    TimeWithTimeZone,
    TimestampWithTimeZone,
    Binary,
    VarBinary,
    LongVarBinary,
    Null,
    Other,
    Boolean,
    Blob,
    Clob,
    NClob,
}

const ALL: [SqlType; 30] = [
    SqlType::Bit,
    SqlType::TinyInt,
    SqlType::SmallInt,
    SqlType::Integer,
    SqlType::BigInt,
    SqlType::Float,
    SqlType::Real,
    SqlType::Double,
    SqlType::Numeric,
    SqlType::Decimal,
    SqlType::Char,
    SqlType::Varchar,
    SqlType::LongVarchar,
    SqlType::NChar,
    SqlType::NVarchar,
    SqlType::LongNVarchar,
    SqlType::Date,
    SqlType::Time,
    SqlType::Timestamp,
    SqlType::TimeWithTimeZone,
    SqlType::TimestampWithTimeZone,
    SqlType::Binary,
    SqlType::VarBinary,
    SqlType::LongVarBinary,
    SqlType::Null,
    SqlType::Other,
    SqlType::Boolean,
    SqlType::Blob,
    SqlType::Clob,
    SqlType::NClob,
];

impl SqlType {
    /// Look up a type by its numeric code.
    ///
    /// Returns `Err(Error::UnknownSqlType)` for codes outside the vocabulary.
    pub fn from_code(code: i32) -> Result<Self> {
        ALL.iter()
            .copied()
            .find(|t| t.code() == code)
            .ok_or(Error::UnknownSqlType { code })
    }

    /// Numeric type code.
    pub fn code(self) -> i32 {
        match self {
            SqlType::Bit => -7,
            SqlType::TinyInt => -6,
            SqlType::SmallInt => 5,
            SqlType::Integer => 4,
            SqlType::BigInt => -5,
            SqlType::Float => 6,
            SqlType::Real => 7,
            SqlType::Double => 8,
            SqlType::Numeric => 2,
            SqlType::Decimal => 3,
            SqlType::Char => 1,
            SqlType::Varchar => 12,
            SqlType::LongVarchar => -1,
            SqlType::NChar => -15,
            SqlType::NVarchar => -9,
            SqlType::LongNVarchar => -16,
            SqlType::Date => 91,
            SqlType::Time => 92,
            SqlType::Timestamp => 93,
            SqlType::TimeWithTimeZone => 2013,
            SqlType::TimestampWithTimeZone => 2014,
            SqlType::Binary => -2,
            SqlType::VarBinary => -3,
            SqlType::LongVarBinary => -4,
            SqlType::Null => 0,
            SqlType::Other => 1111,
            SqlType::Boolean => 16,
            SqlType::Blob => 2004,
            SqlType::Clob => 2005,
            SqlType::NClob => 2011,
        }
    }

    /// Canonical upper-case name.
    pub fn name(self) -> &'static str {
        match self {
            SqlType::Bit => "BIT",
            SqlType::TinyInt => "TINYINT",
            SqlType::SmallInt => "SMALLINT",
            SqlType::Integer => "INTEGER",
            SqlType::BigInt => "BIGINT",
            SqlType::Float => "FLOAT",
            SqlType::Real => "REAL",
            SqlType::Double => "DOUBLE",
            SqlType::Numeric => "NUMERIC",
            SqlType::Decimal => "DECIMAL",
            SqlType::Char => "CHAR",
            SqlType::Varchar => "VARCHAR",
            SqlType::LongVarchar => "LONGVARCHAR",
            SqlType::NChar => "NCHAR",
            SqlType::NVarchar => "NVARCHAR",
            SqlType::LongNVarchar => "LONGNVARCHAR",
            SqlType::Date => "DATE",
            SqlType::Time => "TIME",
            SqlType::Timestamp => "TIMESTAMP",
            SqlType::TimeWithTimeZone => "TIME_WITH_TIMEZONE",
            SqlType::TimestampWithTimeZone => "TIMESTAMP_WITH_TIMEZONE",
            SqlType::Binary => "BINARY",
            SqlType::VarBinary => "VARBINARY",
            SqlType::LongVarBinary => "LONGVARBINARY",
            SqlType::Null => "NULL",
            SqlType::Other => "OTHER",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Blob => "BLOB",
            SqlType::Clob => "CLOB",
            SqlType::NClob => "NCLOB",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            SqlType::TinyInt
                | SqlType::SmallInt
                | SqlType::Integer
                | SqlType::BigInt
                | SqlType::Float
                | SqlType::Real
                | SqlType::Double
                | SqlType::Numeric
                | SqlType::Decimal
        )
    }

    pub fn is_character(self) -> bool {
        matches!(
            self,
            SqlType::Char
                | SqlType::Varchar
                | SqlType::LongVarchar
                | SqlType::NChar
                | SqlType::NVarchar
                | SqlType::LongNVarchar
                | SqlType::Clob
                | SqlType::NClob
        )
    }

    pub fn is_binary(self) -> bool {
        matches!(
            self,
            SqlType::Binary | SqlType::VarBinary | SqlType::LongVarBinary | SqlType::Blob
        )
    }

    /// Whether a column of this type can be opened as a stream of `kind`.
    pub fn supports_stream(self, kind: StreamKind) -> bool {
        match kind {
            StreamKind::Ascii | StreamKind::Unicode => self.is_character(),
            StreamKind::Binary => self.is_binary(),
        }
    }
}

impl std::fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique_and_round_trip() {
        for t in ALL {
            assert_eq!(SqlType::from_code(t.code()).unwrap(), t);
        }
        let mut codes: Vec<i32> = ALL.iter().map(|t| t.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), ALL.len());
    }

    #[test]
    fn test_unknown_code() {
        match SqlType::from_code(4242) {
            Err(Error::UnknownSqlType { code }) => assert_eq!(code, 4242),
            other => panic!("Expected UnknownSqlType, got {:?}", other),
        }
    }

    #[test]
    fn test_stream_compatibility() {
        assert!(SqlType::Clob.supports_stream(StreamKind::Ascii));
        assert!(SqlType::Varchar.supports_stream(StreamKind::Unicode));
        assert!(SqlType::Blob.supports_stream(StreamKind::Binary));
        assert!(!SqlType::Blob.supports_stream(StreamKind::Unicode));
        assert!(!SqlType::Integer.supports_stream(StreamKind::Binary));
        assert!(!SqlType::Integer.supports_stream(StreamKind::Ascii));
    }
}
