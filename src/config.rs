use serde::{Deserialize, Serialize};

use crate::error::DbalError;
use crate::types::DatabaseType;

/// Environment variable that turns on per-statement trace output.
pub const DEBUG_ENV_VAR: &str = "SQL_DBAL_DEBUG";

/// Parameters a driver handle is opened with.
///
/// Serializable so hosts can keep them in their own configuration files:
/// ```rust
/// use sql_dbal::prelude::*;
///
/// let params = ConnectionParams::from_json(r#"{"driver": "sqlite", "dsn": "app.db"}"#)?;
/// assert_eq!(params.driver, DatabaseType::Sqlite);
/// assert!(params.busy_timeout_ms.is_none());
/// # Ok::<(), DbalError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    pub driver: DatabaseType,
    /// Driver specific location: a file path for `SQLite`, a URL for server databases
    pub dsn: String,
    /// Database selected on connect, when the driver supports selection
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub busy_timeout_ms: Option<u64>,
    /// Put `SQLite` files into WAL journal mode on connect
    #[serde(default)]
    pub wal: bool,
}

impl ConnectionParams {
    #[must_use]
    pub fn new(driver: DatabaseType, dsn: impl Into<String>) -> Self {
        Self {
            driver,
            dsn: dsn.into(),
            database: None,
            busy_timeout_ms: None,
            wal: false,
        }
    }

    /// Parse parameters from a JSON document.
    ///
    /// # Errors
    /// Returns `DbalError::Config` if the document is not valid parameters.
    pub fn from_json(json: &str) -> Result<Self, DbalError> {
        serde_json::from_str(json)
            .map_err(|e| DbalError::Config(format!("invalid connection parameters: {e}")))
    }
}

/// Per-connection behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Emit a trace line for every executed statement
    pub debug: bool,
}

impl ConnectionOptions {
    /// Read the switches from the environment ([`DEBUG_ENV_VAR`]).
    #[must_use]
    pub fn from_env() -> Self {
        let debug = std::env::var(DEBUG_ENV_VAR)
            .map(|v| flag_enabled(&v))
            .unwrap_or(false);
        Self { debug }
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

fn flag_enabled(value: &str) -> bool {
    let value = value.trim();
    !(value.is_empty() || value == "0" || value.eq_ignore_ascii_case("false"))
}
