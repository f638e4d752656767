//! Event-driven transactions.
//!
//! A [`Transaction`] owns an [`Events`] bus with three lifecycle events.
//! Callbacks are start handlers; the outcome of running them decides
//! whether the commit or the rollback event fires. Other buses can be tied
//! to that outcome with [`Transaction::defer_events`], so their events are
//! only delivered once the work is committed.
//!
//! ```rust
//! use sql_dbal::prelude::*;
//!
//! let mut conn = SqliteOptionsBuilder::new(":memory:").connect()?;
//! conn.execute_update("CREATE TABLE t (v INTEGER)", ())?;
//!
//! let mut tx = conn.transaction_with(|conn| {
//!     conn.execute_update("INSERT INTO t (v) VALUES (?)", (1_i64,))?;
//!     Ok(1_i64)
//! });
//! assert_eq!(tx.execute()?, &[1]);
//! assert!(tx.state().is_committed());
//! # Ok::<(), DbalError>(())
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::connection::{self, Connection};
use crate::error::DbalError;
use crate::events::Events;
use crate::tx_outcome::{TransactionState, TxOutcome};

pub const START_TRANSACTION: &str = "startTransaction";
pub const COMMIT_TRANSACTION: &str = "commitTransaction";
pub const ROLLBACK_TRANSACTION: &str = "rollbackTransaction";

enum Handle<'c> {
    Borrowed(&'c mut Connection),
    /// The process-wide default connection, locked for each run
    Default,
}

/// A unit of work run between `BEGIN` and `COMMIT`.
pub struct Transaction<'c, V> {
    conn: Handle<'c>,
    events: Events<Connection>,
    // start handlers push into this; drained into `results` after each run
    collected: Rc<RefCell<Vec<V>>>,
    results: Vec<V>,
    state: TransactionState,
}

impl<'c, V: 'static> Transaction<'c, V> {
    #[must_use]
    pub fn new(conn: &'c mut Connection) -> Self {
        Self::with_handle(Handle::Borrowed(conn))
    }

    /// Build a transaction, register `f`, and run it when `execute` is true.
    ///
    /// # Errors
    /// Returns the error from [`execute`](Self::execute).
    pub fn create<F>(conn: &'c mut Connection, f: F, execute: bool) -> Result<Self, DbalError>
    where
        F: FnMut(&mut Connection) -> Result<V, DbalError> + 'static,
    {
        let mut tx = Self::new(conn);
        tx.callback(f);
        if execute {
            tx.execute()?;
        }
        Ok(tx)
    }

    fn with_handle(conn: Handle<'c>) -> Self {
        Self {
            conn,
            events: Events::new(),
            collected: Rc::new(RefCell::new(Vec::new())),
            results: Vec::new(),
            state: TransactionState::Idle,
        }
    }

    /// Register a unit of work. Its return value is appended to the results.
    pub fn callback<F>(&mut self, mut f: F) -> &mut Self
    where
        F: FnMut(&mut Connection) -> Result<V, DbalError> + 'static,
    {
        let collected = Rc::clone(&self.collected);
        self.events.register(START_TRANSACTION, move |_, conn| {
            let value = f(conn)?;
            collected.borrow_mut().push(value);
            Ok(())
        });
        self
    }

    /// Register a unit of work that receives `args` on every run.
    pub fn callback_with<A, F>(&mut self, args: A, mut f: F) -> &mut Self
    where
        A: 'static,
        F: FnMut(&mut Connection, &A) -> Result<V, DbalError> + 'static,
    {
        self.callback(move |conn| f(conn, &args))
    }

    pub fn events(&self) -> &Events<Connection> {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut Events<Connection> {
        &mut self.events
    }

    /// Hold the events of `bus` until this transaction finishes.
    ///
    /// The bus is corked before any callback runs. On commit its held events
    /// are released in order, and their handlers may emit further events on
    /// the same bus; on rollback they are discarded.
    pub fn defer_events<E>(&mut self, bus: Rc<RefCell<Events<E>>>) -> &mut Self
    where
        E: Clone + 'static,
    {
        let start = Rc::clone(&bus);
        self.events.prepend(START_TRANSACTION, move |_, _| {
            start.borrow_mut().cork();
            Ok(())
        });
        let commit = Rc::clone(&bus);
        self.events.register(COMMIT_TRANSACTION, move |_, _| {
            Events::uncork_shared(&commit)
        });
        self.events.register(ROLLBACK_TRANSACTION, move |_, _| {
            bus.borrow_mut().discard();
            Events::uncork_shared(&bus)
        });
        self
    }

    /// Run the transaction.
    ///
    /// Begins, triggers the start event (running every callback in order),
    /// commits and triggers the commit event. If any of these fails the
    /// transaction is rolled back, the rollback event fires, and the
    /// original error is returned. Failures during rollback are logged.
    ///
    /// # Errors
    /// Returns the first error raised by begin, a callback, commit, or a
    /// commit handler.
    pub fn execute(&mut self) -> Result<&[V], DbalError> {
        self.results.clear();
        self.collected.borrow_mut().clear();
        self.state = TransactionState::Running;

        let events = &mut self.events;
        let outcome = match &mut self.conn {
            Handle::Borrowed(conn) => run(conn, events),
            Handle::Default => connection::with_default(|conn| run(conn, events)),
        };
        self.results.append(&mut self.collected.borrow_mut());

        match outcome {
            Ok(()) => {
                self.state = TransactionState::Finished(TxOutcome::Committed);
                Ok(&self.results)
            }
            Err(err) => {
                self.state = TransactionState::Finished(TxOutcome::RolledBack);
                Err(err)
            }
        }
    }

    /// Values returned by the callbacks of the last run, in registration order.
    #[must_use]
    pub fn results(&self) -> &[V] {
        &self.results
    }

    #[must_use]
    pub fn into_results(self) -> Vec<V> {
        self.results
    }

    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }
}

impl<V: 'static> Transaction<'static, V> {
    /// A transaction on the process-wide default connection.
    #[must_use]
    pub fn with_default() -> Self {
        Self::with_handle(Handle::Default)
    }

    /// [`create`](Transaction::create) against the default connection.
    ///
    /// # Errors
    /// Returns the error from [`execute`](Self::execute), including
    /// `DbalError::Connection` when no default connection is installed.
    pub fn create_default<F>(f: F, execute: bool) -> Result<Self, DbalError>
    where
        F: FnMut(&mut Connection) -> Result<V, DbalError> + 'static,
    {
        let mut tx = Self::with_default();
        tx.callback(f);
        if execute {
            tx.execute()?;
        }
        Ok(tx)
    }
}

fn run(conn: &mut Connection, events: &mut Events<Connection>) -> Result<(), DbalError> {
    let Err(err) = attempt(conn, events) else {
        tracing::debug!(connection = conn.id(), "transaction committed");
        return Ok(());
    };

    tracing::debug!(connection = conn.id(), error = %err, "rolling back transaction");
    if let Err(rollback) = conn.roll_back() {
        tracing::warn!(connection = conn.id(), error = %rollback, "rollback failed");
    }
    if let Err(handler) = events.trigger(ROLLBACK_TRANSACTION, conn) {
        tracing::warn!(connection = conn.id(), error = %handler, "rollback handler failed");
    }
    Err(err)
}

fn attempt(conn: &mut Connection, events: &mut Events<Connection>) -> Result<(), DbalError> {
    conn.begin_transaction()?;
    events.trigger(START_TRANSACTION, conn)?;
    conn.commit()?;
    events.trigger(COMMIT_TRANSACTION, conn)
}

impl<V> fmt::Debug for Transaction<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("default_connection", &matches!(self.conn, Handle::Default))
            .field("events", &self.events)
            .field("results", &self.results.len())
            .field("state", &self.state)
            .finish()
    }
}
