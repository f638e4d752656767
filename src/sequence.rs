//! Identifier allocation on a dedicated connection.
//!
//! The pool owns its own [`Connection`], so identifiers it hands out are
//! committed independently of whatever transaction the primary connection
//! has open and survive its rollback.

use crate::connection::Connection;
use crate::error::DbalError;

/// Default name of the table holding sequence values.
pub const DEFAULT_TABLE: &str = "sequences";

#[derive(Debug)]
pub struct SequencePool {
    conn: Box<Connection>,
    table: String,
    initialized: bool,
}

impl SequencePool {
    #[must_use]
    pub fn new(conn: Connection) -> Self {
        Self::with_table(conn, DEFAULT_TABLE)
    }

    #[must_use]
    pub fn with_table(conn: Connection, table: &str) -> Self {
        Self {
            conn: Box::new(conn),
            table: table.to_string(),
            initialized: false,
        }
    }

    /// Create the sequence table if it does not exist yet.
    ///
    /// # Errors
    /// Returns the error from running the DDL.
    pub fn initialize(&mut self) -> Result<&mut Self, DbalError> {
        if !self.initialized {
            let ddl = self.conn.platform().sequence_table_sql(&self.table);
            self.conn.execute_update(&ddl, ())?;
            self.initialized = true;
            tracing::debug!(table = %self.table, "sequence table ready");
        }
        Ok(self)
    }

    /// Allocate the next value of sequence `name`, starting at `start`.
    ///
    /// Names are case-insensitive. The allocation commits on the pool's
    /// connection before this returns.
    ///
    /// # Errors
    /// Returns the error from the upsert or the read-back; the pool's
    /// transaction is rolled back first.
    pub fn next(&mut self, name: &str, start: i64) -> Result<i64, DbalError> {
        self.initialize()?;
        let name = name.to_uppercase();
        let upsert = self.conn.platform().sequence_upsert_sql(&self.table);
        let select = self.select_sql();

        self.conn.begin_transaction()?;
        let allocated = self.allocate(&upsert, &select, &name, start);

        match allocated {
            Ok(id) => {
                self.conn.commit()?;
                tracing::debug!(sequence = %name, id, "allocated");
                Ok(id)
            }
            Err(err) => {
                if let Err(rollback) = self.conn.roll_back() {
                    tracing::warn!(sequence = %name, error = %rollback, "sequence rollback failed");
                }
                Err(err)
            }
        }
    }

    /// The last value allocated for `name`, if any.
    ///
    /// # Errors
    /// Returns the error from the query.
    pub fn current(&mut self, name: &str) -> Result<Option<i64>, DbalError> {
        self.initialize()?;
        let select = self.select_sql();
        let mut rs = self.conn.execute(&select, (name.to_uppercase(),))?;
        Ok(rs.scalar(0_usize)?.and_then(|v| v.as_int().copied()))
    }

    /// Forget one sequence, or every sequence when `name` is `None`.
    ///
    /// # Errors
    /// Returns the error from the delete.
    pub fn clear(&mut self, name: Option<&str>) -> Result<&mut Self, DbalError> {
        self.initialize()?;
        let table = self.conn.platform().quote_identifier(&self.table);
        match name {
            Some(name) => {
                let sql = format!("DELETE FROM {table} WHERE name = ?");
                self.conn.execute_update(&sql, (name.to_uppercase(),))?;
            }
            None => {
                let sql = format!("DELETE FROM {table}");
                self.conn.execute_update(&sql, ())?;
            }
        }
        Ok(self)
    }

    /// # Errors
    /// Returns `DbalError::Driver` if the connection fails to close.
    pub fn close(&mut self) -> Result<(), DbalError> {
        self.conn.close()?;
        Ok(())
    }

    /// The pool's own connection.
    pub fn connection(&mut self) -> &mut Connection {
        &mut self.conn
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    fn allocate(
        &mut self,
        upsert: &str,
        select: &str,
        name: &str,
        start: i64,
    ) -> Result<i64, DbalError> {
        self.conn.execute_update(upsert, (name, start))?;
        let mut rs = self.conn.execute(select, (name,))?;
        rs.scalar(0_usize)?
            .and_then(|v| v.as_int().copied())
            .ok_or_else(|| DbalError::Other(format!("sequence {name} has no value")))
    }

    fn select_sql(&self) -> String {
        format!(
            "SELECT id FROM {} WHERE name = ?",
            self.conn.platform().quote_identifier(&self.table)
        )
    }
}
