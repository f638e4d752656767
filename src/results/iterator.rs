use std::fmt;
use std::sync::Arc;

use crate::driver::Statement;
use crate::error::DbalError;
use crate::results::row::{ColumnRef, Row};
use crate::types::RowValues;

/// Transforms a raw row before it is handed to the caller.
pub type Hydrator = Arc<dyn Fn(Row) -> Row + Send + Sync>;

enum Cursor {
    /// Nothing fetched yet
    Unpositioned,
    Row(Row),
    Exhausted,
}

/// Forward-only cursor over a driver statement with one row of lookahead.
///
/// After construction the cursor is unpositioned: call [`advance`](Self::advance)
/// before reading [`current`](Self::current). Each `advance` calls
/// [`Statement::fetch`] exactly once; the fetch that reports end of data is
/// the last one ever made. Rewinding, seeking and keys are not supported.
pub struct ResultIterator {
    stmt: Box<dyn Statement>,
    hydrator: Option<Hydrator>,
    cursor: Cursor,
    fetched: usize,
    // prefetch failure held back until the row fetched before it was consumed
    pending: Option<DbalError>,
}

impl ResultIterator {
    #[must_use]
    pub fn new(stmt: Box<dyn Statement>) -> Self {
        Self {
            stmt,
            hydrator: None,
            cursor: Cursor::Unpositioned,
            fetched: 0,
            pending: None,
        }
    }

    pub fn set_hydrator(&mut self, hydrator: Option<Hydrator>) {
        self.hydrator = hydrator;
    }

    /// False only once the end of data has been reached.
    #[must_use]
    pub fn valid(&self) -> bool {
        !matches!(self.cursor, Cursor::Exhausted)
    }

    /// The current row; `None` before the first `advance` and after exhaustion.
    #[must_use]
    pub fn current(&self) -> Option<&Row> {
        match &self.cursor {
            Cursor::Row(row) => Some(row),
            _ => None,
        }
    }

    /// Fetch the next row and promote it to current.
    ///
    /// # Errors
    /// Returns `DbalError::Driver` if the statement fails to fetch; the cursor
    /// is then exhausted.
    pub fn advance(&mut self) -> Result<(), DbalError> {
        if matches!(self.cursor, Cursor::Exhausted) {
            return Ok(());
        }
        match self.stmt.fetch() {
            Ok(Some(row)) => {
                let row = match &self.hydrator {
                    Some(hydrate) => hydrate(row),
                    None => row,
                };
                self.fetched += 1;
                self.cursor = Cursor::Row(row);
                Ok(())
            }
            Ok(None) => {
                self.cursor = Cursor::Exhausted;
                Ok(())
            }
            Err(err) => {
                self.cursor = Cursor::Exhausted;
                Err(err.into())
            }
        }
    }

    /// Zero-based position of the current row, or of the row the next
    /// `advance` will produce while unpositioned.
    #[must_use]
    pub fn offset(&self) -> usize {
        match self.cursor {
            Cursor::Row(_) => self.fetched - 1,
            _ => self.fetched,
        }
    }

    /// The statement's total row count as reported by the driver.
    ///
    /// This is an upper bound on the rows still to come, not the remainder.
    /// [`Iterator::count`] instead consumes the remaining rows.
    #[must_use]
    pub fn row_count(&self) -> u64 {
        self.stmt.row_count()
    }

    /// # Errors
    /// Always returns `DbalError::Unsupported`.
    pub fn key(&self) -> Result<usize, DbalError> {
        Err(DbalError::Unsupported("key"))
    }

    /// # Errors
    /// Always returns `DbalError::Unsupported`.
    pub fn rewind(&mut self) -> Result<(), DbalError> {
        Err(DbalError::Unsupported("rewind"))
    }

    /// # Errors
    /// Always returns `DbalError::Unsupported`.
    pub fn seek(&mut self, _position: usize) -> Result<(), DbalError> {
        Err(DbalError::Unsupported("seek"))
    }

    /// Surface a held prefetch failure.
    pub(crate) fn check_pending(&mut self) -> Result<(), DbalError> {
        self.pending.take().map_or(Ok(()), Err)
    }

    /// Take the next row, prefetching the one after it.
    pub(crate) fn take_row(&mut self) -> Result<Option<Row>, DbalError> {
        self.check_pending()?;
        if !matches!(self.cursor, Cursor::Row(_)) {
            self.advance()?;
        }
        match std::mem::replace(&mut self.cursor, Cursor::Unpositioned) {
            Cursor::Row(row) => {
                if let Err(err) = self.advance() {
                    self.pending = Some(err);
                }
                Ok(Some(row))
            }
            other => {
                self.cursor = other;
                Ok(None)
            }
        }
    }
}

impl Iterator for ResultIterator {
    type Item = Result<Row, DbalError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.take_row().transpose()
    }
}

impl fmt::Debug for ResultIterator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultIterator")
            .field("fetched", &self.fetched)
            .field("valid", &self.valid())
            .field("hydrated", &self.hydrator.is_some())
            .finish_non_exhaustive()
    }
}

/// Single-pass iterator over one column of the remaining rows.
pub struct ColumnIter<'a> {
    rows: &'a mut ResultIterator,
    column: ColumnRef,
}

impl<'a> ColumnIter<'a> {
    pub(crate) fn new(rows: &'a mut ResultIterator, column: ColumnRef) -> Self {
        Self { rows, column }
    }
}

impl Iterator for ColumnIter<'_> {
    type Item = Result<RowValues, DbalError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.rows.take_row() {
            Ok(Some(row)) => Some(row.column(&self.column).cloned()),
            Ok(None) => None,
            Err(err) => Some(Err(err)),
        }
    }
}
