use std::fmt;
use std::time::Duration;

use crate::config::ConnectionParams;
use crate::driver::{BufferedStatement, Driver, Statement};
use crate::error::DriverError;
use crate::sqlite::params::Params;
use crate::sqlite::query::read_rows;
use crate::types::{DatabaseType, RowValues};

/// `SQLITE_MISUSE`, reported for calls on a closed handle
const SQLITE_MISUSE: i32 = 21;

/// [`Driver`] over a single rusqlite connection.
///
/// Rows of a query are read when it executes, because a rusqlite statement
/// borrows its connection; callers still consume them through a
/// forward-only [`Statement`].
pub struct SqliteDriver {
    params: ConnectionParams,
    conn: Option<rusqlite::Connection>,
}

impl SqliteDriver {
    /// Open the database described by `params`.
    ///
    /// # Errors
    /// Returns `DriverError` if the file cannot be opened or configured.
    pub fn open(params: ConnectionParams) -> Result<Self, DriverError> {
        let mut driver = Self { params, conn: None };
        driver.connect()?;
        Ok(driver)
    }

    fn handle(&mut self) -> Result<&mut rusqlite::Connection, DriverError> {
        self.conn
            .as_mut()
            .ok_or_else(|| DriverError::new(SQLITE_MISUSE, "connection is closed"))
    }

    fn batch(&mut self, sql: &str) -> Result<(), DriverError> {
        self.handle()?.execute_batch(sql)?;
        Ok(())
    }
}

impl Driver for SqliteDriver {
    fn execute_query(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Box<dyn Statement>, DriverError> {
        let params = Params::convert(params);
        let conn = self.handle()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = read_rows(&mut stmt, &params)?;
        Ok(Box::new(BufferedStatement::new(rows)))
    }

    fn execute_update(&mut self, sql: &str, params: &[RowValues]) -> Result<u64, DriverError> {
        let params = Params::convert(params);
        let conn = self.handle()?;
        let affected = conn.execute(sql, &params.as_refs()[..])?;
        Ok(affected as u64)
    }

    fn last_insert_id(&self) -> Option<i64> {
        self.conn
            .as_ref()
            .map(rusqlite::Connection::last_insert_rowid)
            .filter(|id| *id != 0)
    }

    fn begin_transaction(&mut self) -> Result<(), DriverError> {
        self.batch("BEGIN")
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        self.batch("COMMIT")
    }

    fn roll_back(&mut self) -> Result<(), DriverError> {
        self.batch("ROLLBACK")
    }

    fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    fn connect(&mut self) -> Result<(), DriverError> {
        let conn = rusqlite::Connection::open(&self.params.dsn)?;
        if let Some(ms) = self.params.busy_timeout_ms {
            conn.busy_timeout(Duration::from_millis(ms))?;
        }
        let journal_mode: String = if self.params.wal {
            conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?
        } else {
            conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?
        };
        tracing::debug!(dsn = %self.params.dsn, %journal_mode, "sqlite connection opened");
        self.conn = Some(conn);
        Ok(())
    }

    fn close(&mut self) -> Result<(), DriverError> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, err)| DriverError::from(err))?;
        }
        Ok(())
    }

    fn params(&self) -> &ConnectionParams {
        &self.params
    }

    fn kind(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    fn database(&self) -> Option<String> {
        self.conn.as_ref().map(|_| "main".to_string())
    }

    fn reopen(&self) -> Result<Box<dyn Driver>, DriverError> {
        Ok(Box::new(SqliteDriver::open(self.params.clone())?))
    }
}

impl fmt::Debug for SqliteDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteDriver")
            .field("dsn", &self.params.dsn)
            .field("connected", &self.conn.is_some())
            .finish()
    }
}
