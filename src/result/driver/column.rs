//! Native column types of the driver backend and their mapping onto the
//! shared column vocabulary.
//!
//! Type numbers are the Oracle TTC data type codes.

use crate::error::{Error, Result};
use crate::types::{ColumnDescriptor, SqlType};

pub(crate) const TYPE_NUM_VARCHAR: u8 = 1;
pub(crate) const TYPE_NUM_NUMBER: u8 = 2;
pub(crate) const TYPE_NUM_BINARY_INTEGER: u8 = 3;
pub(crate) const TYPE_NUM_LONG: u8 = 8;
pub(crate) const TYPE_NUM_DATE: u8 = 12;
pub(crate) const TYPE_NUM_RAW: u8 = 23;
pub(crate) const TYPE_NUM_LONG_RAW: u8 = 24;
pub(crate) const TYPE_NUM_CHAR: u8 = 96;
pub(crate) const TYPE_NUM_CLOB: u8 = 112;
pub(crate) const TYPE_NUM_BLOB: u8 = 113;
pub(crate) const TYPE_NUM_TIMESTAMP: u8 = 180;
pub(crate) const TYPE_NUM_TIMESTAMP_TZ: u8 = 181;

/// Backend data type with type-specific attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeType {
    /// VARCHAR2(max_size) - variable-length string.
    Varchar2 { max_size: u32 },
    /// CHAR(max_size) - fixed-length string.
    Char { max_size: u32 },
    /// LONG - legacy large text.
    Long,
    /// NUMBER(precision, scale). Precision 0 means unconstrained.
    Number { precision: i8, scale: i8 },
    BinaryInteger,
    /// DATE - date and time to the second, no zone.
    Date,
    /// TIMESTAMP - date and time with fractional seconds, no zone.
    Timestamp,
    /// TIMESTAMP WITH TIME ZONE, offset zones only.
    TimestampTz,
    /// RAW(max_size) - variable-length binary.
    Raw { max_size: u32 },
    LongRaw,
    Clob,
    Nclob,
    Blob,
}

impl NativeType {
    /// Create from raw type number and describe attributes.
    ///
    /// Returns `Err(Error::UnsupportedType)` for unsupported types.
    pub fn from_raw(type_num: u8, precision: i8, scale: i8, max_size: u32) -> Result<Self> {
        match type_num {
            TYPE_NUM_VARCHAR => Ok(NativeType::Varchar2 { max_size }),
            TYPE_NUM_CHAR => Ok(NativeType::Char { max_size }),
            TYPE_NUM_LONG => Ok(NativeType::Long),
            TYPE_NUM_NUMBER => Ok(NativeType::Number { precision, scale }),
            TYPE_NUM_BINARY_INTEGER => Ok(NativeType::BinaryInteger),
            TYPE_NUM_DATE => Ok(NativeType::Date),
            TYPE_NUM_TIMESTAMP => Ok(NativeType::Timestamp),
            TYPE_NUM_TIMESTAMP_TZ => Ok(NativeType::TimestampTz),
            TYPE_NUM_RAW => Ok(NativeType::Raw { max_size }),
            TYPE_NUM_LONG_RAW => Ok(NativeType::LongRaw),
            TYPE_NUM_CLOB => Ok(NativeType::Clob),
            TYPE_NUM_BLOB => Ok(NativeType::Blob),
            _ => Err(Error::UnsupportedType { type_num }),
        }
    }

    pub fn type_num(&self) -> u8 {
        match self {
            NativeType::Varchar2 { .. } => TYPE_NUM_VARCHAR,
            NativeType::Char { .. } => TYPE_NUM_CHAR,
            NativeType::Long => TYPE_NUM_LONG,
            NativeType::Number { .. } => TYPE_NUM_NUMBER,
            NativeType::BinaryInteger => TYPE_NUM_BINARY_INTEGER,
            NativeType::Date => TYPE_NUM_DATE,
            NativeType::Timestamp => TYPE_NUM_TIMESTAMP,
            NativeType::TimestampTz => TYPE_NUM_TIMESTAMP_TZ,
            NativeType::Raw { .. } => TYPE_NUM_RAW,
            NativeType::LongRaw => TYPE_NUM_LONG_RAW,
            NativeType::Clob | NativeType::Nclob => TYPE_NUM_CLOB,
            NativeType::Blob => TYPE_NUM_BLOB,
        }
    }

    /// Backend spelling of the type name, without attributes.
    pub fn name(&self) -> &'static str {
        match self {
            NativeType::Varchar2 { .. } => "VARCHAR2",
            NativeType::Char { .. } => "CHAR",
            NativeType::Long => "LONG",
            NativeType::Number { .. } => "NUMBER",
            NativeType::BinaryInteger => "BINARY_INTEGER",
            NativeType::Date => "DATE",
            NativeType::Timestamp => "TIMESTAMP",
            NativeType::TimestampTz => "TIMESTAMP WITH TIME ZONE",
            NativeType::Raw { .. } => "RAW",
            NativeType::LongRaw => "LONG RAW",
            NativeType::Clob => "CLOB",
            NativeType::Nclob => "NCLOB",
            NativeType::Blob => "BLOB",
        }
    }

    /// Entry in the shared type vocabulary.
    ///
    /// DATE carries a time of day, so it maps to `Timestamp`.
    pub fn sql_type(&self) -> SqlType {
        match self {
            NativeType::Varchar2 { .. } => SqlType::Varchar,
            NativeType::Char { .. } => SqlType::Char,
            NativeType::Long => SqlType::LongVarchar,
            NativeType::Number { .. } => SqlType::Numeric,
            NativeType::BinaryInteger => SqlType::Integer,
            NativeType::Date | NativeType::Timestamp => SqlType::Timestamp,
            NativeType::TimestampTz => SqlType::TimestampWithTimeZone,
            NativeType::Raw { .. } => SqlType::VarBinary,
            NativeType::LongRaw => SqlType::LongVarBinary,
            NativeType::Clob => SqlType::Clob,
            NativeType::Nclob => SqlType::NClob,
            NativeType::Blob => SqlType::Blob,
        }
    }

    /// Declared size: characters or bytes for sized types, precision for
    /// numbers, encoded width for temporals.
    pub fn length(&self) -> u32 {
        match self {
            NativeType::Varchar2 { max_size }
            | NativeType::Char { max_size }
            | NativeType::Raw { max_size } => *max_size,
            NativeType::Number { precision, .. } if *precision > 0 => *precision as u32,
            NativeType::Number { .. } => 38,
            NativeType::BinaryInteger => 10,
            NativeType::Date => 7,
            NativeType::Timestamp => 11,
            NativeType::TimestampTz => 13,
            NativeType::Long
            | NativeType::LongRaw
            | NativeType::Clob
            | NativeType::Nclob
            | NativeType::Blob => u32::MAX,
        }
    }

    /// Digits after the decimal point. Negative scales report 0.
    pub fn decimals(&self) -> i32 {
        match self {
            NativeType::Number { scale, .. } => (*scale as i32).max(0),
            _ => 0,
        }
    }

    pub fn is_lob(&self) -> bool {
        matches!(self, NativeType::Clob | NativeType::Nclob | NativeType::Blob)
    }
}

impl std::fmt::Display for NativeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NativeType::Varchar2 { max_size }
            | NativeType::Char { max_size }
            | NativeType::Raw { max_size } => write!(f, "{}({})", self.name(), max_size),
            NativeType::Number { precision, scale } => {
                if *precision == 0 && *scale == 0 {
                    write!(f, "NUMBER")
                } else if *scale == 0 {
                    write!(f, "NUMBER({})", precision)
                } else {
                    write!(f, "NUMBER({},{})", precision, scale)
                }
            }
            other => f.write_str(other.name()),
        }
    }
}

/// Column as described by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeColumn {
    pub name: String,
    /// Source table, empty for expressions.
    pub table_name: String,
    pub native_type: NativeType,
    pub nullable: bool,
    /// Identity column.
    pub identity: bool,
}

impl NativeColumn {
    pub fn new(name: impl Into<String>, native_type: NativeType) -> Self {
        Self {
            name: name.into(),
            table_name: String::new(),
            native_type,
            nullable: true,
            identity: false,
        }
    }

    /// Create from raw describe data.
    pub fn from_raw(
        name: impl Into<String>,
        type_num: u8,
        precision: i8,
        scale: i8,
        max_size: u32,
    ) -> Result<Self> {
        NativeType::from_raw(type_num, precision, scale, max_size).map(|t| Self::new(name, t))
    }

    pub fn with_table(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_identity(mut self, identity: bool) -> Self {
        self.identity = identity;
        self
    }

    /// Descriptor in the shared vocabulary. The position is assigned by
    /// [`ResultMetadata::new`](crate::ResultMetadata::new).
    pub fn describe(&self) -> ColumnDescriptor {
        let native_type = &self.native_type;
        ColumnDescriptor::new(self.name.clone(), native_type.sql_type())
            .with_table(self.table_name.clone())
            .with_type_name(native_type.name())
            .with_length(native_type.length())
            .with_decimals(native_type.decimals())
            .with_signed(matches!(
                native_type,
                NativeType::Number { .. } | NativeType::BinaryInteger
            ))
            .with_nullable(self.nullable)
            .with_auto_increment(self.identity)
    }
}
