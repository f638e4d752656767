use std::fmt;
use std::sync::Arc;

use crate::driver::{EmptyStatement, Statement};
use crate::error::DbalError;
use crate::results::iterator::{ColumnIter, Hydrator, ResultIterator};
use crate::results::row::{ColumnRef, Row};
use crate::types::RowValues;

/// The result of executing a statement.
///
/// A read-only, forward-only view over the statement's rows. It reads like
/// an indexable collection but only ever walks its single cursor forward:
/// rows are fetched from the driver on demand, one ahead of the caller.
///
/// ```rust
/// use sql_dbal::prelude::*;
///
/// let mut rs = ResultSet::from_update(3, Some(42));
/// assert_eq!(rs.affected_rows(), 3);
/// assert_eq!(rs.last_insert_id(), Some(42));
/// assert!(rs.row()?.is_none());
/// # Ok::<(), DbalError>(())
/// ```
pub struct ResultSet {
    stmt: Option<Box<dyn Statement>>,
    iterator: Option<ResultIterator>,
    affected_rows: u64,
    last_insert_id: Option<i64>,
    hydrator: Option<Hydrator>,
}

impl ResultSet {
    /// Wrap a statement produced by the query path.
    #[must_use]
    pub fn from_statement(stmt: Box<dyn Statement>) -> Self {
        Self {
            stmt: Some(stmt),
            iterator: None,
            affected_rows: 0,
            last_insert_id: None,
            hydrator: None,
        }
    }

    /// A terminal result from the update path: no rows, only counts.
    #[must_use]
    pub fn from_update(affected_rows: u64, last_insert_id: Option<i64>) -> Self {
        Self {
            stmt: None,
            iterator: None,
            affected_rows,
            last_insert_id,
            hydrator: None,
        }
    }

    /// Set the row transform used by the iterator.
    ///
    /// Only an iterator created after this call picks the hydrator up.
    pub fn set_hydrator<F>(&mut self, hydrator: F) -> &mut Self
    where
        F: Fn(Row) -> Row + Send + Sync + 'static,
    {
        self.hydrator = Some(Arc::new(hydrator));
        self
    }

    /// The single cursor over this result, created on first use.
    ///
    /// Every consumer shares it, so reads through one handle advance all of them.
    pub fn iterator(&mut self) -> &mut ResultIterator {
        let stmt = &mut self.stmt;
        let hydrator = &self.hydrator;
        self.iterator.get_or_insert_with(|| {
            let stmt = stmt
                .take()
                .unwrap_or_else(|| Box::new(EmptyStatement) as Box<dyn Statement>);
            let mut iterator = ResultIterator::new(stmt);
            iterator.set_hydrator(hydrator.clone());
            iterator
        })
    }

    /// Materialize every remaining row.
    ///
    /// # Errors
    /// Returns the first fetch error encountered.
    pub fn to_array(&mut self) -> Result<Vec<Row>, DbalError> {
        self.iterator().collect()
    }

    /// The next row, or `None` once the result is exhausted.
    ///
    /// # Errors
    /// Returns `DbalError::Driver` if fetching fails.
    pub fn row(&mut self) -> Result<Option<Row>, DbalError> {
        self.iterator().take_row()
    }

    /// One column of the next row, or `None` once the result is exhausted.
    ///
    /// # Errors
    /// Returns `DbalError::ColumnNotFound` if the row lacks the column.
    pub fn scalar(&mut self, column: impl Into<ColumnRef>) -> Result<Option<RowValues>, DbalError> {
        let column = column.into();
        match self.row()? {
            Some(row) => row.column(&column).cloned().map(Some),
            None => Ok(None),
        }
    }

    /// Iterate a single column of the remaining rows; `None` selects the first.
    pub fn column(&mut self, column: Option<ColumnRef>) -> ColumnIter<'_> {
        let column = column.unwrap_or(ColumnRef::Index(0));
        ColumnIter::new(self.iterator(), column)
    }

    /// # Errors
    /// Always returns `DbalError::Unsupported`: the cursor is forward-only.
    pub fn seek(&mut self, offset: usize) -> Result<&mut Self, DbalError> {
        self.iterator().seek(offset)?;
        Ok(self)
    }

    /// Number of rows affected by a write; 0 for query-path results.
    #[must_use]
    pub fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    /// Same as [`affected_rows`](Self::affected_rows).
    #[must_use]
    pub fn count(&self) -> u64 {
        self.affected_rows
    }

    #[must_use]
    pub fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }

    /// # Errors
    /// Always returns `DbalError::Unsupported`.
    pub fn fields(&self) -> Result<Vec<String>, DbalError> {
        Err(DbalError::Unsupported("fields"))
    }

    /// Read the row at `offset`.
    ///
    /// Only the cursor's natural forward position can be read: the current
    /// row, or row 0 before anything was fetched. Any other offset would
    /// need a seek.
    ///
    /// # Errors
    /// Returns `DbalError::Unsupported` for any other offset, or a fetch
    /// failure held from the previous read.
    pub fn offset_get(&mut self, offset: usize) -> Result<Option<&Row>, DbalError> {
        let iterator = self.iterator();
        if offset != iterator.offset() {
            return iterator.seek(offset).map(|()| None);
        }
        iterator.check_pending()?;
        if iterator.current().is_none() && iterator.valid() {
            iterator.advance()?;
        }
        Ok(iterator.current())
    }

    /// Whether a row exists at `offset`; same positioning rules as `offset_get`.
    ///
    /// # Errors
    /// Returns `DbalError::Unsupported` for offsets other than the forward position.
    pub fn offset_exists(&mut self, offset: usize) -> Result<bool, DbalError> {
        Ok(self.offset_get(offset)?.is_some())
    }

    /// # Errors
    /// Always returns `DbalError::Unsupported`: result sets are read-only.
    pub fn offset_set(&mut self, _offset: usize, _row: Row) -> Result<(), DbalError> {
        Err(DbalError::Unsupported("offset_set"))
    }

    /// # Errors
    /// Always returns `DbalError::Unsupported`: result sets are read-only.
    pub fn offset_unset(&mut self, _offset: usize) -> Result<(), DbalError> {
        Err(DbalError::Unsupported("offset_unset"))
    }
}

impl<'a> IntoIterator for &'a mut ResultSet {
    type Item = Result<Row, DbalError>;
    type IntoIter = &'a mut ResultIterator;

    fn into_iter(self) -> Self::IntoIter {
        self.iterator()
    }
}

impl fmt::Debug for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultSet")
            .field("affected_rows", &self.affected_rows)
            .field("last_insert_id", &self.last_insert_id)
            .field("iterator", &self.iterator)
            .finish_non_exhaustive()
    }
}
