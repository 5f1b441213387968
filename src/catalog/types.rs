//! Column and table metadata.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Declared column types.
///
/// Only carried as metadata: every stored value is text, and the evaluator
/// parses a value as a signed integer wherever a comparison or sum needs one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Signed 64-bit integers.
    Integer,
    /// Arbitrary text.
    Text,
}

impl DataType {
    /// Get the SQL name for this type.
    pub fn sql_name(&self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Text => "TEXT",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql_name())
    }
}

/// A column of a table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    /// Column name, normalized to lowercase.
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl ColumnMeta {
    /// Create a new nullable column definition.
    pub fn new(name: impl AsRef<str>, data_type: DataType) -> Self {
        Self {
            name: normalize_name(name.as_ref()),
            data_type,
            nullable: true,
        }
    }

    /// Mark the column as NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

impl fmt::Display for ColumnMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.data_type)?;
        if !self.nullable {
            write!(f, " NOT NULL")?;
        }
        Ok(())
    }
}

/// Schema of one table plus the location of its backing data file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMeta {
    pub id: u64,
    /// Table name, normalized to lowercase.
    pub name: String,
    pub columns: Vec<ColumnMeta>,
    pub data_file: PathBuf,
}

impl TableMeta {
    pub fn new(id: u64, name: impl AsRef<str>, columns: Vec<ColumnMeta>, data_file: impl AsRef<Path>) -> Self {
        Self {
            id,
            name: normalize_name(name.as_ref()),
            columns,
            data_file: data_file.as_ref().to_path_buf(),
        }
    }

    /// Column names in schema order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Whether two schemas agree on column names, types and nullability, in order.
    pub fn same_columns(&self, other: &[ColumnMeta]) -> bool {
        self.columns.as_slice() == other
    }
}

impl fmt::Display for TableMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", col)?;
        }
        write!(f, ")")
    }
}

/// Catalog names are case-insensitive and ignore surrounding whitespace.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
