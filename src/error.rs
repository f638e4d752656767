use thiserror::Error;

/// A failure reported by a driver, carrying the driver's native error code.
///
/// Drivers return this from every fallible call; [`crate::Connection::execute`]
/// classifies it into [`DbalError::Deadlock`] or [`DbalError::Database`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("driver error {code}: {info}")]
pub struct DriverError {
    /// Native error code (MySQL error number, SQLite extended result code, ...)
    pub code: i32,
    /// Human readable error information from the driver
    pub info: String,
}

impl DriverError {
    #[must_use]
    pub fn new(code: i32, info: impl Into<String>) -> Self {
        Self {
            code,
            info: info.into(),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for DriverError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, msg) => DriverError {
                code: failure.extended_code,
                info: msg.clone().unwrap_or_else(|| failure.to_string()),
            },
            // SQLITE_ERROR for failures that never reached the engine
            _ => DriverError::new(1, err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum DbalError {
    /// The driver reported a deadlock or lock conflict; the statement may be retried.
    #[error("Deadlock detected ({code}): {info}")]
    Deadlock { code: i32, info: String },

    /// Any other error reported while executing a statement.
    #[error("Database error ({code}): {info}")]
    Database { code: i32, info: String },

    /// A driver failure outside statement execution (connect, begin, commit, ...).
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("Unsupported {0} operation")]
    Unsupported(&'static str),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Parameter error: {0}")]
    Parameter(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    /// An error raised by application code running inside a transaction.
    #[error(transparent)]
    Callback(Box<dyn std::error::Error + Send + Sync>),

    #[error("Other database error: {0}")]
    Other(String),
}

impl DbalError {
    /// Wrap an application error so it can be returned from a transaction callback.
    pub fn callback<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        DbalError::Callback(err.into())
    }

    /// Whether the error is a deadlock the caller may choose to retry.
    #[must_use]
    pub fn is_deadlock(&self) -> bool {
        matches!(self, DbalError::Deadlock { .. })
    }

    /// Whether the error came from an unsupported operation on a forward-only result.
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, DbalError::Unsupported(_))
    }

    /// The native driver code, if the error originated in the driver.
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        match self {
            DbalError::Deadlock { code, .. } | DbalError::Database { code, .. } => Some(*code),
            DbalError::Driver(err) => Some(err.code),
            _ => None,
        }
    }
}

pub type Result<T, E = DbalError> = std::result::Result<T, E>;
