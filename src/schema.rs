use std::fmt;

use crate::connection::Connection;
use crate::error::DbalError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// A table name, optionally qualified with its database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    pub database: Option<String>,
    pub table: String,
}

impl TableName {
    /// Parse `table` or `database.table`.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.split_once('.') {
            Some((database, table)) => Self {
                database: Some(database.to_string()),
                table: table.to_string(),
            },
            None => Self {
                database: None,
                table: name.to_string(),
            },
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.database {
            Some(database) => write!(f, "{database}.{}", self.table),
            None => f.write_str(&self.table),
        }
    }
}

/// A table reached through a connection.
pub struct Table<'a> {
    name: TableName,
    conn: &'a mut Connection,
}

impl<'a> Table<'a> {
    pub(crate) fn new(name: TableName, conn: &'a mut Connection) -> Self {
        Self { name, conn }
    }

    #[must_use]
    pub fn name(&self) -> &TableName {
        &self.name
    }

    /// Whether the table exists in its database.
    ///
    /// # Errors
    /// Returns the error from the catalog query.
    pub fn exists(&mut self) -> Result<bool, DbalError> {
        let sql = self.conn.platform().table_exists_sql();
        let database = self.name.database.clone().map_or(RowValues::Null, RowValues::Text);
        let mut rs = self
            .conn
            .execute(sql, (database, self.name.table.as_str()))?;
        Ok(rs.row()?.is_some())
    }

    /// Insert one row given as `(column, value)` pairs.
    ///
    /// # Errors
    /// Returns `DbalError::Parameter` for an empty column list, or the error
    /// from the insert.
    pub fn insert(&mut self, columns: &[(&str, RowValues)]) -> Result<ResultSet, DbalError> {
        if columns.is_empty() {
            return Err(DbalError::Parameter("insert needs at least one column".into()));
        }
        let platform = self.conn.platform();
        let names: Vec<String> = columns
            .iter()
            .map(|(name, _)| platform.quote_identifier(name))
            .collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            self.quoted(),
            names.join(", ")
        );
        let values: Vec<RowValues> = columns.iter().map(|(_, v)| v.clone()).collect();
        self.conn.execute_update(&sql, values)
    }

    /// Remove every row.
    ///
    /// # Errors
    /// Returns the error from the statement.
    pub fn truncate(&mut self) -> Result<&mut Self, DbalError> {
        let sql = self.conn.platform().truncate_sql(&self.quoted());
        self.conn.execute_update(&sql, ())?;
        Ok(self)
    }

    fn quoted(&self) -> String {
        let platform = self.conn.platform();
        match &self.name.database {
            Some(database) => format!(
                "{}.{}",
                platform.quote_identifier(database),
                platform.quote_identifier(&self.name.table)
            ),
            None => platform.quote_identifier(&self.name.table),
        }
    }
}

impl fmt::Debug for Table<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table").field("name", &self.name).finish()
    }
}
