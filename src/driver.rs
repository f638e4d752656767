//! The driver contract the access layer sits on.
//!
//! A [`Driver`] owns one live database handle. Statement failures come back
//! as [`DriverError`] values carrying the native error code, which
//! [`crate::Connection`] classifies. A [`Statement`] is a forward-only source
//! of rows.

use std::collections::VecDeque;

use crate::config::ConnectionParams;
use crate::error::DriverError;
use crate::results::Row;
use crate::types::{DatabaseType, RowValues};

/// A forward-only statement handle.
pub trait Statement: Send {
    /// The next row, or `None` at end of data.
    ///
    /// # Errors
    /// Returns `DriverError` if the driver fails while stepping the statement.
    fn fetch(&mut self) -> Result<Option<Row>, DriverError>;

    /// Total rows the driver reports for the statement.
    fn row_count(&self) -> u64;
}

/// One live connection to a database server or file.
pub trait Driver: Send {
    /// Run a statement through the query path, returning its rows.
    ///
    /// # Errors
    /// Returns `DriverError` with the driver's native code on failure.
    fn execute_query(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Box<dyn Statement>, DriverError>;

    /// Run a statement through the update path, returning the affected row count.
    ///
    /// # Errors
    /// Returns `DriverError` with the driver's native code on failure.
    fn execute_update(&mut self, sql: &str, params: &[RowValues]) -> Result<u64, DriverError>;

    /// Identifier generated by the last insert on this handle, if any.
    fn last_insert_id(&self) -> Option<i64>;

    /// # Errors
    /// Returns `DriverError` if the transaction cannot be started.
    fn begin_transaction(&mut self) -> Result<(), DriverError>;

    /// # Errors
    /// Returns `DriverError` if committing fails.
    fn commit(&mut self) -> Result<(), DriverError>;

    /// # Errors
    /// Returns `DriverError` if rolling back fails.
    fn roll_back(&mut self) -> Result<(), DriverError>;

    fn is_connected(&self) -> bool;

    /// # Errors
    /// Returns `DriverError` if the connection cannot be opened.
    fn connect(&mut self) -> Result<(), DriverError>;

    /// # Errors
    /// Returns `DriverError` if the handle fails to close cleanly.
    fn close(&mut self) -> Result<(), DriverError>;

    /// The parameters this handle was opened with.
    fn params(&self) -> &ConnectionParams;

    /// The database type spoken by this driver.
    fn kind(&self) -> DatabaseType;

    /// The database currently in use, as reported by the driver.
    fn database(&self) -> Option<String>;

    /// Open a new, independent handle with the same parameters and driver type.
    ///
    /// # Errors
    /// Returns `DriverError` if the new handle cannot be opened.
    fn reopen(&self) -> Result<Box<dyn Driver>, DriverError>;
}

/// A statement with no rows, used behind update-path results.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyStatement;

impl Statement for EmptyStatement {
    fn fetch(&mut self) -> Result<Option<Row>, DriverError> {
        Ok(None)
    }

    fn row_count(&self) -> u64 {
        0
    }
}

/// A statement whose rows were read from the driver up front.
///
/// Drivers whose native statements borrow the connection hand rows over
/// through this type; callers still see a forward-only cursor.
#[derive(Debug, Default, Clone)]
pub struct BufferedStatement {
    rows: VecDeque<Row>,
    row_count: u64,
}

impl BufferedStatement {
    #[must_use]
    pub fn new(rows: Vec<Row>) -> Self {
        let row_count = rows.len() as u64;
        Self {
            rows: rows.into(),
            row_count,
        }
    }
}

impl Statement for BufferedStatement {
    fn fetch(&mut self) -> Result<Option<Row>, DriverError> {
        Ok(self.rows.pop_front())
    }

    fn row_count(&self) -> u64 {
        self.row_count
    }
}
