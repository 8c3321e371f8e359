//! CQL values bound to and read from statements.

use chrono::{DateTime, Utc};

/// A value bound to a statement marker or read from a result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Blob(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl Value {
    /// The blob bytes, if this is a blob.
    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// A result row with named columns. Null columns are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: Vec<(String, Option<Value>)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column.
    pub fn with_column(mut self, name: impl Into<String>, value: Option<Value>) -> Self {
        self.columns.push((name.into(), value));
        self
    }

    /// Look up a non-null column by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .and_then(|(_, value)| value.as_ref())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
