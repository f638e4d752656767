use std::sync::Arc;

use crate::error::DbalError;
use crate::types::RowValues;

/// Selects a column either by position or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

impl From<usize> for ColumnRef {
    fn from(idx: usize) -> Self {
        ColumnRef::Index(idx)
    }
}

impl From<&str> for ColumnRef {
    fn from(name: &str) -> Self {
        ColumnRef::Name(name.to_string())
    }
}

impl From<String> for ColumnRef {
    fn from(name: String) -> Self {
        ColumnRef::Name(name)
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnRef::Index(idx) => write!(f, "#{idx}"),
            ColumnRef::Name(name) => f.write_str(name),
        }
    }
}

/// A row fetched from a statement.
///
/// Behaves as an ordered associative mapping: values are reachable by
/// column name or by position, and column order is the driver's order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// The column names (shared across all rows of one statement)
    column_names: Arc<Vec<String>>,
    /// The values, positionally aligned with `column_names`
    values: Vec<RowValues>,
}

impl Row {
    /// Create a row from shared column names and aligned values.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<RowValues>) -> Self {
        Self {
            column_names,
            values,
        }
    }

    /// Build a row from `(name, value)` pairs.
    ///
    /// ```rust
    /// use sql_dbal::prelude::*;
    ///
    /// let row = Row::from_pairs([("a", RowValues::Int(1)), ("b", RowValues::Int(2))]);
    /// assert_eq!(row.get("b"), Some(&RowValues::Int(2)));
    /// ```
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, RowValues)>,
        K: Into<String>,
    {
        let (names, values): (Vec<String>, Vec<RowValues>) =
            pairs.into_iter().map(|(k, v)| (k.into(), v)).unzip();
        Self::new(Arc::new(names), values)
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn values(&self) -> &[RowValues] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<RowValues> {
        self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get the index of a column by name
    #[must_use]
    pub fn column_index(&self, column_name: &str) -> Option<usize> {
        self.column_names.iter().position(|col| col == column_name)
    }

    /// Get a value from the row by column name
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value from the row by column index
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.values.get(index)
    }

    /// Get a value by position or name.
    ///
    /// # Errors
    /// Returns `DbalError::ColumnNotFound` if the row has no such column.
    pub fn column(&self, column: &ColumnRef) -> Result<&RowValues, DbalError> {
        let found = match column {
            ColumnRef::Index(idx) => self.get_by_index(*idx),
            ColumnRef::Name(name) => self.get(name),
        };
        found.ok_or_else(|| DbalError::ColumnNotFound(column.to_string()))
    }

    /// Replace the value of a named column, or append it when absent.
    ///
    /// Intended for hydrators that enrich a raw row.
    #[must_use]
    pub fn with(mut self, column_name: &str, value: impl Into<RowValues>) -> Self {
        let value = value.into();
        match self.column_index(column_name) {
            Some(idx) => self.values[idx] = value,
            None => {
                Arc::make_mut(&mut self.column_names).push(column_name.to_string());
                self.values.push(value);
            }
        }
        self
    }

    /// Iterate `(column name, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowValues)> {
        self.column_names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}
