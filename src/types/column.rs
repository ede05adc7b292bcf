//! Column descriptors and the per-result descriptor set.
//!
//! A [`ResultMetadata`] is fixed when a result is created and never changes
//! while it is iterated. Column positions are 1-based.

use crate::error::{Error, Result};

use super::sql_type::SqlType;

/// Immutable description of one result column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    /// 1-based position, assigned by [`ResultMetadata::new`].
    pub position: usize,
    /// Table the column comes from, empty when unknown or computed.
    pub table_name: String,
    /// Column name.
    pub name: String,
    /// Column label (alias). Equals `name` unless aliased.
    pub label: String,
    /// Type tag from the shared vocabulary.
    pub sql_type: SqlType,
    /// Backend-specific type name.
    pub type_name: String,
    /// Declared maximum size (characters, bytes or precision).
    pub length: u32,
    /// Scale for numeric types, 0 otherwise.
    pub decimals: i32,
    /// Whether numeric values are signed.
    pub signed: bool,
    /// Whether NULL values are allowed.
    pub nullable: bool,
    /// Whether the column is generated by the backend.
    pub auto_increment: bool,
}

impl ColumnDescriptor {
    /// Create a nullable column with the type's canonical name and no table.
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        let name = name.into();
        Self {
            position: 0,
            table_name: String::new(),
            label: name.clone(),
            name,
            sql_type,
            type_name: sql_type.name().to_string(),
            length: 0,
            decimals: 0,
            signed: sql_type.is_numeric(),
            nullable: true,
            auto_increment: false,
        }
    }

    pub fn with_table(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    pub fn with_decimals(mut self, decimals: i32) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn with_signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_auto_increment(mut self, auto_increment: bool) -> Self {
        self.auto_increment = auto_increment;
        self
    }

    /// Numeric type code of `sql_type`.
    pub fn type_code(&self) -> i32 {
        self.sql_type.code()
    }
}

/// Column descriptors for all columns of a result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultMetadata {
    columns: Vec<ColumnDescriptor>,
}

impl ResultMetadata {
    /// Create metadata from columns in result order, numbering positions from 1.
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        let columns = columns
            .into_iter()
            .enumerate()
            .map(|(i, mut c)| {
                c.position = i + 1;
                c
            })
            .collect();
        Self { columns }
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Validate a 1-based column index, returning its 0-based offset.
    pub fn check_index(&self, column_index: usize) -> Result<usize> {
        if column_index == 0 || column_index > self.columns.len() {
            return Err(Error::ColumnIndexOutOfBounds {
                index: column_index,
                count: self.columns.len(),
            });
        }
        Ok(column_index - 1)
    }

    /// Get a column by 1-based index.
    pub fn column(&self, column_index: usize) -> Result<&ColumnDescriptor> {
        let offset = self.check_index(column_index)?;
        Ok(&self.columns[offset])
    }

    /// Get column labels.
    pub fn column_labels(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.label.as_str()).collect()
    }

    /// Find the 1-based index of a column by label (case-insensitive).
    pub fn find_by_label(&self, label: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.label.eq_ignore_ascii_case(label))
            .map(|offset| offset + 1)
    }

    /// Like [`find_by_label`](Self::find_by_label) but fails with `ColumnNotFound`.
    pub fn require_label(&self, label: &str) -> Result<usize> {
        self.find_by_label(label)
            .ok_or_else(|| Error::ColumnNotFound {
                label: label.to_string(),
            })
    }

    /// Build metadata for a subset of columns, in the given order.
    pub fn project(&self, column_indexes: &[usize]) -> Result<Self> {
        let columns = column_indexes
            .iter()
            .map(|&i| self.column(i).cloned())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(columns))
    }
}
