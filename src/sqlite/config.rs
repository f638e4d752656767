use std::time::Duration;

use crate::config::ConnectionParams;
use crate::connection::Connection;
use crate::error::DbalError;
use crate::sqlite::driver::SqliteDriver;
use crate::types::DatabaseType;

/// Fluent builder for `SQLite` connection parameters.
///
/// ```rust
/// use sql_dbal::prelude::*;
///
/// let params = SqliteOptionsBuilder::new("app.db")
///     .wal(true)
///     .busy_timeout(std::time::Duration::from_millis(250))
///     .finish();
/// assert_eq!(params.driver, DatabaseType::Sqlite);
/// assert_eq!(params.busy_timeout_ms, Some(250));
/// ```
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    params: ConnectionParams,
}

impl SqliteOptionsBuilder {
    /// Start from a database path; `":memory:"` opens a private in-memory database.
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            params: ConnectionParams::new(DatabaseType::Sqlite, db_path),
        }
    }

    /// Put the database into WAL journal mode on connect.
    #[must_use]
    pub fn wal(mut self, wal: bool) -> Self {
        self.params.wal = wal;
        self
    }

    /// How long a statement waits on a locked database before failing with `SQLITE_BUSY`.
    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.params.busy_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    #[must_use]
    pub fn finish(self) -> ConnectionParams {
        self.params
    }

    /// Open a driver handle.
    ///
    /// # Errors
    /// Returns `DbalError::Driver` if the database cannot be opened.
    pub fn open(self) -> Result<SqliteDriver, DbalError> {
        Ok(SqliteDriver::open(self.finish())?)
    }

    /// Open a [`Connection`] on a new driver handle.
    ///
    /// # Errors
    /// Returns `DbalError::Driver` if the database cannot be opened.
    pub fn connect(self) -> Result<Connection, DbalError> {
        Ok(Connection::new(Box::new(self.open()?)))
    }
}

impl ConnectionParams {
    #[must_use]
    pub fn sqlite_builder(db_path: impl Into<String>) -> SqliteOptionsBuilder {
        SqliteOptionsBuilder::new(db_path)
    }
}
