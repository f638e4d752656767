//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::binder::Binder;
pub use crate::config::{ConnectionOptions, ConnectionParams};
pub use crate::connection::Connection;
pub use crate::driver::{Driver, Statement};
pub use crate::error::{DbalError, DriverError};
pub use crate::events::Events;
pub use crate::filter::{Filter, FilterChain};
pub use crate::platform::Platform;
pub use crate::results::{ColumnRef, ResultIterator, ResultSet, Row};
pub use crate::schema::{Table, TableName};
pub use crate::sequence::SequencePool;
pub use crate::transaction::{
    COMMIT_TRANSACTION, ROLLBACK_TRANSACTION, START_TRANSACTION, Transaction,
};
pub use crate::tx_outcome::{TransactionState, TxOutcome};
pub use crate::types::{DatabaseType, IntoParams, RowValues};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteDriver, SqliteOptionsBuilder};
