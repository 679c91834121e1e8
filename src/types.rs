use std::collections::HashMap;
use std::fmt;

use crate::error::{ShelfloadError, ShelfloadResult};

/// Scalar value carried by a source record and bound as a statement parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Empty strings and nulls count as blank
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            Self::Integer(_) => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(v) => write!(f, "{}", v),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// One flat key/value unit read from a source file
pub type Record = HashMap<String, FieldValue>;

/// Ordered collection of records bound for one table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordBatch {
    pub records: Vec<Record>,
}

impl RecordBatch {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }
}

impl From<Vec<Record>> for RecordBatch {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

/// How a source value is turned into a bound parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Passed through as text; the field must be present
    Text,
    /// Parsed as an integer; the field must be present
    Integer,
    /// Text where an empty or absent value becomes NULL
    NullableText,
}

/// One entry of a field map: source field name to target column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub source: String,
    pub column: String,
    pub coercion: Coercion,
}

impl FieldMapping {
    pub fn new(source: impl Into<String>, column: impl Into<String>, coercion: Coercion) -> Self {
        Self {
            source: source.into(),
            column: column.into(),
            coercion,
        }
    }

    pub fn text(source: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(source, column, Coercion::Text)
    }

    pub fn integer(source: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(source, column, Coercion::Integer)
    }

    pub fn nullable_text(source: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(source, column, Coercion::NullableText)
    }
}

/// Ordered, non-empty mapping from source field names to target columns.
///
/// The order of the entries fixes the column order of the insert statement
/// and the positional order of its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    entries: Vec<FieldMapping>,
}

impl FieldMap {
    pub fn new(entries: Vec<FieldMapping>) -> ShelfloadResult<Self> {
        if entries.is_empty() {
            return Err(ShelfloadError::configuration("field map must not be empty"));
        }

        for (i, entry) in entries.iter().enumerate() {
            if entries[..i].iter().any(|e| e.source == entry.source) {
                return Err(ShelfloadError::configuration(format!(
                    "field map lists source field '{}' twice",
                    entry.source
                )));
            }
            if entries[..i].iter().any(|e| e.column == entry.column) {
                return Err(ShelfloadError::configuration(format!(
                    "field map targets column '{}' twice",
                    entry.column
                )));
            }
        }

        Ok(Self { entries })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldMapping> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Target column names in map order
    pub fn columns(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.column.as_str()).collect()
    }
}
