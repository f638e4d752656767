//! SQL dialect knowledge needed by the access layer.

use crate::types::DatabaseType;

/// Dialect specific SQL and error-code knowledge.
pub trait Platform: Send + Sync {
    fn name(&self) -> &'static str;

    /// Quote an identifier for use in generated SQL.
    fn quote_identifier(&self, ident: &str) -> String;

    /// Whether a native error code signals a deadlock or lock conflict.
    fn is_deadlock(&self, code: i32) -> bool;

    /// Statement that switches the active database, if the dialect has one.
    fn select_database_sql(&self, database: &str) -> Option<String>;

    /// Query returning one row when the table exists; binds `(database, table)`.
    fn table_exists_sql(&self) -> &'static str;

    /// DDL for the sequence table.
    fn sequence_table_sql(&self, table: &str) -> String;

    /// Insert-or-increment for one sequence; binds `(name, start)`.
    fn sequence_upsert_sql(&self, table: &str) -> String;

    fn truncate_sql(&self, table: &str) -> String;
}

/// `MySQL` / `MariaDB` dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct MysqlPlatform;

/// `ER_LOCK_DEADLOCK`
pub const MYSQL_DEADLOCK: i32 = 1213;
/// Second deadlock code treated as retryable
pub const MYSQL_DEADLOCK_ALT: i32 = 1479;

impl Platform for MysqlPlatform {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    fn is_deadlock(&self, code: i32) -> bool {
        code == MYSQL_DEADLOCK || code == MYSQL_DEADLOCK_ALT
    }

    fn select_database_sql(&self, database: &str) -> Option<String> {
        Some(format!("USE {}", self.quote_identifier(database)))
    }

    fn table_exists_sql(&self) -> &'static str {
        "SELECT TABLE_NAME FROM information_schema.TABLES WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?"
    }

    fn sequence_table_sql(&self, table: &str) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (name VARCHAR(255) NOT NULL PRIMARY KEY, id INT UNSIGNED NOT NULL) ENGINE=InnoDB",
            self.quote_identifier(table)
        )
    }

    fn sequence_upsert_sql(&self, table: &str) -> String {
        format!(
            "INSERT INTO {} (name, id) VALUES (?, ?) ON DUPLICATE KEY UPDATE id = id + 1",
            self.quote_identifier(table)
        )
    }

    fn truncate_sql(&self, table: &str) -> String {
        format!("TRUNCATE TABLE {table}")
    }
}

/// `SQLite` dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlitePlatform;

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

impl Platform for SqlitePlatform {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn is_deadlock(&self, code: i32) -> bool {
        // extended codes carry the primary code in the low byte
        matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED)
    }

    fn select_database_sql(&self, _database: &str) -> Option<String> {
        None
    }

    fn table_exists_sql(&self) -> &'static str {
        "SELECT name FROM pragma_table_list WHERE schema = ?1 AND name = ?2 AND type = 'table'"
    }

    fn sequence_table_sql(&self, table: &str) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (name TEXT NOT NULL PRIMARY KEY, id INTEGER NOT NULL)",
            self.quote_identifier(table)
        )
    }

    fn sequence_upsert_sql(&self, table: &str) -> String {
        format!(
            "INSERT INTO {} (name, id) VALUES (?1, ?2) ON CONFLICT(name) DO UPDATE SET id = id + 1",
            self.quote_identifier(table)
        )
    }

    fn truncate_sql(&self, table: &str) -> String {
        format!("DELETE FROM {table}")
    }
}

static MYSQL: MysqlPlatform = MysqlPlatform;
static SQLITE: SqlitePlatform = SqlitePlatform;

/// The platform for a database type.
#[must_use]
pub fn for_database(kind: DatabaseType) -> &'static dyn Platform {
    match kind {
        DatabaseType::Mysql => &MYSQL,
        DatabaseType::Sqlite => &SQLITE,
    }
}
