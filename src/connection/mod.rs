// Connection is split into:
// - core: statement execution, classification and tracing
// - tx: transaction primitives and the Transaction factories
// - default: the process-wide default connection

mod core;
mod default;
mod tx;

use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

use regex::Regex;

use crate::binder::Binder;
use crate::config::{ConnectionOptions, ConnectionParams};
use crate::driver::Driver;
use crate::error::DbalError;
use crate::filter::FilterChain;
use crate::platform::{self, Platform};
use crate::schema::{Table, TableName};
use crate::sequence::SequencePool;

pub use default::{install_default, take_default, with_default};

/// `tracing` target of the per-statement debug trace.
pub const TRACE_TARGET: &str = "sql_dbal::trace";

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

static IDENTIFIER: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$"));

/// A connection to one database.
///
/// Every statement goes through [`Connection::execute`] (or
/// [`Connection::execute_update`]), which runs the filter chain, keeps the
/// statement counters and turns driver failures into [`DbalError`]s.
pub struct Connection {
    driver: Box<dyn Driver>,
    filter: FilterChain,
    sequence_pool: Option<SequencePool>,
    selected_database: Option<String>,
    options: ConnectionOptions,
    id: u64,
    statements: u64,
}

impl Connection {
    /// Wrap a driver, reading the debug switch from the environment.
    #[must_use]
    pub fn new(driver: Box<dyn Driver>) -> Self {
        Self::with_options(driver, ConnectionOptions::from_env())
    }

    #[must_use]
    pub fn with_options(driver: Box<dyn Driver>, options: ConnectionOptions) -> Self {
        let selected_database = driver.params().database.clone();
        Self {
            driver,
            filter: FilterChain::new(),
            sequence_pool: None,
            selected_database,
            options,
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            statements: 0,
        }
    }

    /// Open a connection with a bundled driver.
    ///
    /// # Errors
    /// Returns `DbalError::Config` when no bundled driver handles
    /// `params.driver`, or the driver's error if the handle cannot be opened.
    pub fn open(params: ConnectionParams) -> Result<Self, DbalError> {
        match params.driver {
            #[cfg(feature = "sqlite")]
            crate::types::DatabaseType::Sqlite => {
                let driver = crate::sqlite::SqliteDriver::open(params)?;
                Ok(Self::new(Box::new(driver)))
            }
            other => Err(DbalError::Config(format!(
                "no bundled driver for {other:?}; wrap your own with Connection::new"
            ))),
        }
    }

    /// Switch the active database.
    ///
    /// # Errors
    /// Returns `DbalError::Config` for a name that is not a plain identifier,
    /// `DbalError::Unsupported` if the platform cannot select databases, or the
    /// error from running the statement.
    pub fn select_database(&mut self, name: &str) -> Result<&mut Self, DbalError> {
        let pattern = IDENTIFIER
            .as_ref()
            .map_err(|e| DbalError::Config(e.to_string()))?;
        if !pattern.is_match(name) {
            return Err(DbalError::Config(format!("invalid database name: {name:?}")));
        }
        let sql = self
            .platform()
            .select_database_sql(name)
            .ok_or(DbalError::Unsupported("select_database"))?;
        self.execute(&sql, ())?;
        self.selected_database = Some(name.to_string());
        Ok(self)
    }

    /// The selected database, falling back to what the driver reports.
    #[must_use]
    pub fn selected_database(&self) -> Option<String> {
        self.selected_database
            .clone()
            .or_else(|| self.driver.database())
    }

    /// Reconnect, closing the current handle first if it is open.
    ///
    /// # Errors
    /// Returns `DbalError::Driver` if closing or connecting fails.
    pub fn connect(&mut self) -> Result<&mut Self, DbalError> {
        if self.driver.is_connected() {
            self.driver.close()?;
        }
        self.driver.connect()?;
        tracing::debug!(connection = self.id, "connected");
        Ok(self)
    }

    /// Close the handle, then the sequence pool's connection if one was opened.
    ///
    /// Both handles are always closed.
    ///
    /// # Errors
    /// Returns the first `DbalError::Driver` raised while closing.
    pub fn close(&mut self) -> Result<&mut Self, DbalError> {
        let primary = self.driver.close().map_err(DbalError::from);
        let pool = match self.sequence_pool.as_mut() {
            Some(pool) => pool.close(),
            None => Ok(()),
        };
        if let (Err(_), Err(pool_err)) = (&primary, &pool) {
            tracing::warn!(connection = self.id, error = %pool_err, "sequence pool close failed");
        }
        primary.and(pool)?;
        tracing::debug!(connection = self.id, "closed");
        Ok(self)
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.driver.is_connected()
    }

    #[must_use]
    pub fn charset(&self) -> &'static str {
        "utf8"
    }

    /// The identifier allocator for this connection, opened on first use.
    ///
    /// The pool runs on its own handle (same parameters, new connection), so
    /// allocations survive a rollback on this one.
    ///
    /// # Errors
    /// Returns `DbalError::Driver` if the second handle cannot be opened.
    pub fn sequence_pool(&mut self) -> Result<&mut SequencePool, DbalError> {
        if self.sequence_pool.is_none() {
            let driver = self.driver.reopen()?;
            let conn = Connection::with_options(driver, self.options);
            tracing::debug!(
                connection = self.id,
                pool_connection = conn.id,
                "opened sequence pool connection"
            );
            self.sequence_pool = Some(SequencePool::new(conn));
        }
        self.sequence_pool
            .as_mut()
            .ok_or_else(|| DbalError::Other("sequence pool unavailable".into()))
    }

    #[must_use]
    pub fn binder(&self) -> Binder {
        Binder::new()
    }

    /// A handle on a table; an unqualified name resolves against the
    /// selected database.
    pub fn table(&mut self, name: &str) -> Table<'_> {
        let mut name = TableName::parse(name);
        if name.database.is_none() {
            name.database = self.selected_database();
        }
        Table::new(name, self)
    }

    #[must_use]
    pub fn platform(&self) -> &'static dyn Platform {
        platform::for_database(self.driver.kind())
    }

    #[must_use]
    pub fn filter_chain(&self) -> &FilterChain {
        &self.filter
    }

    pub fn filter_chain_mut(&mut self) -> &mut FilterChain {
        &mut self.filter
    }

    #[must_use]
    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    /// Process-unique identifier of this connection.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Statements executed through this connection.
    #[must_use]
    pub fn statements_executed(&self) -> u64 {
        self.statements
    }

    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.options.debug
    }

    pub fn set_debug(&mut self, debug: bool) -> &mut Self {
        self.options.debug = debug;
        self
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("kind", &self.driver.kind())
            .field("selected_database", &self.selected_database)
            .field("statements", &self.statements)
            .field("filters", &self.filter.len())
            .field("sequence_pool", &self.sequence_pool.is_some())
            .finish_non_exhaustive()
    }
}
