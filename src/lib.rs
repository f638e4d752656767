//! A synchronous access layer between application code and a SQL driver.
//!
//! [`Connection::execute`] is the single path statements take: it runs the
//! [`FilterChain`], counts and times the statement, and classifies driver
//! failures (deadlocks apart from everything else). [`Transaction`] drives
//! begin/commit/rollback through an [`Events`] bus, and [`ResultSet`] reads
//! rows lazily through a forward-only cursor.

pub mod binder;
pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod events;
pub mod filter;
pub mod metrics;
pub mod platform;
pub mod prelude;
pub mod results;
pub mod schema;
pub mod sequence;
pub mod transaction;
pub mod tx_outcome;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use binder::Binder;
pub use config::{ConnectionOptions, ConnectionParams, DEBUG_ENV_VAR};
pub use connection::{Connection, TRACE_TARGET};
pub use driver::{BufferedStatement, Driver, EmptyStatement, Statement};
pub use error::{DbalError, DriverError};
pub use events::Events;
pub use filter::{Filter, FilterChain};
pub use platform::{MysqlPlatform, Platform, SqlitePlatform};
pub use results::{ColumnRef, ResultIterator, ResultSet, Row};
pub use schema::{Table, TableName};
pub use sequence::SequencePool;
pub use transaction::Transaction;
pub use tx_outcome::{TransactionState, TxOutcome};
pub use types::{DatabaseType, IntoParams, RowValues};
