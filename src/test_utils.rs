//! Scripted driver for exercising the access layer without a database.
//!
//! [`ScriptedDriver`] records every call it receives and replays rows and
//! failures configured through its [`ScriptHandle`], which stays usable after
//! the driver has been moved into a [`crate::Connection`].

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::ConnectionParams;
use crate::driver::{Driver, Statement};
use crate::error::DriverError;
use crate::results::Row;
use crate::types::{DatabaseType, RowValues};

/// Everything a scripted driver was asked to do, in order.
#[derive(Debug, Default, Clone)]
pub struct DriverLog {
    /// `begin`, `commit`, `rollback`, `query:<sql>`, `update:<sql>`, `connect`, `close`, `reopen`
    pub calls: Vec<String>,
    /// Parameters of each query or update, in call order
    pub params: Vec<Vec<RowValues>>,
    /// `Statement::fetch` calls across every statement of this driver
    pub fetches: usize,
}

impl DriverLog {
    /// Calls naming a statement, without their `query:` / `update:` prefix.
    #[must_use]
    pub fn statements(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| c.strip_prefix("query:").or_else(|| c.strip_prefix("update:")))
            .collect()
    }

    #[must_use]
    pub fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }
}

#[derive(Default)]
struct Script {
    rows: HashMap<String, Vec<Row>>,
    failures: VecDeque<DriverError>,
    fail_begin: Option<DriverError>,
    fail_commit: Option<DriverError>,
    fail_rollback: Option<DriverError>,
    fail_close: Option<DriverError>,
    fail_fetch_after: Option<(usize, DriverError)>,
    affected: u64,
    last_insert_id: Option<i64>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Configures and inspects a [`ScriptedDriver`] from outside.
#[derive(Clone, Default)]
pub struct ScriptHandle {
    script: Arc<Mutex<Script>>,
    log: Arc<Mutex<DriverLog>>,
    reopened: Arc<Mutex<Vec<ScriptHandle>>>,
}

impl ScriptHandle {
    /// Rows returned for `sql` by every future query.
    pub fn rows(&self, sql: &str, rows: Vec<Row>) -> &Self {
        lock(&self.script).rows.insert(sql.to_string(), rows);
        self
    }

    /// Fail the next query or update with `code`.
    pub fn fail_next(&self, code: i32, info: &str) -> &Self {
        lock(&self.script)
            .failures
            .push_back(DriverError::new(code, info));
        self
    }

    pub fn fail_begin(&self, code: i32, info: &str) -> &Self {
        lock(&self.script).fail_begin = Some(DriverError::new(code, info));
        self
    }

    pub fn fail_commit(&self, code: i32, info: &str) -> &Self {
        lock(&self.script).fail_commit = Some(DriverError::new(code, info));
        self
    }

    pub fn fail_rollback(&self, code: i32, info: &str) -> &Self {
        lock(&self.script).fail_rollback = Some(DriverError::new(code, info));
        self
    }

    pub fn fail_close(&self, code: i32, info: &str) -> &Self {
        lock(&self.script).fail_close = Some(DriverError::new(code, info));
        self
    }

    /// Make the next query's statement fail after yielding `rows` rows.
    pub fn fail_fetch_after(&self, rows: usize, code: i32, info: &str) -> &Self {
        lock(&self.script).fail_fetch_after = Some((rows, DriverError::new(code, info)));
        self
    }

    /// Affected-row count and insert id reported by updates.
    pub fn update_result(&self, affected: u64, last_insert_id: Option<i64>) -> &Self {
        let mut script = lock(&self.script);
        script.affected = affected;
        script.last_insert_id = last_insert_id;
        self
    }

    /// A snapshot of the call log.
    #[must_use]
    pub fn log(&self) -> DriverLog {
        lock(&self.log).clone()
    }

    /// Handles of drivers opened through `reopen`, oldest first.
    #[must_use]
    pub fn reopened(&self) -> Vec<ScriptHandle> {
        lock(&self.reopened).clone()
    }

    fn record(&self, call: String) {
        lock(&self.log).calls.push(call);
    }
}

/// A [`Driver`] that plays back a script instead of talking to a database.
///
/// ```rust
/// use sql_dbal::prelude::*;
/// use sql_dbal::test_utils::ScriptedDriver;
///
/// let driver = ScriptedDriver::new(DatabaseType::Mysql);
/// let script = driver.handle();
/// script.rows("SELECT 1", vec![Row::from_pairs([("1", RowValues::Int(1))])]);
///
/// let mut conn = Connection::new(Box::new(driver));
/// assert_eq!(conn.execute("SELECT 1", ())?.scalar(0_usize)?, Some(RowValues::Int(1)));
/// assert_eq!(script.log().statements(), vec!["SELECT 1"]);
/// # Ok::<(), DbalError>(())
/// ```
pub struct ScriptedDriver {
    params: ConnectionParams,
    handle: ScriptHandle,
    connected: bool,
}

impl ScriptedDriver {
    #[must_use]
    pub fn new(kind: DatabaseType) -> Self {
        Self::with_params(ConnectionParams::new(kind, "scripted://"))
    }

    #[must_use]
    pub fn with_params(params: ConnectionParams) -> Self {
        Self {
            params,
            handle: ScriptHandle::default(),
            connected: true,
        }
    }

    #[must_use]
    pub fn handle(&self) -> ScriptHandle {
        self.handle.clone()
    }

    fn next_failure(&self) -> Option<DriverError> {
        lock(&self.handle.script).failures.pop_front()
    }

    fn record_statement(&self, kind: &str, sql: &str, params: &[RowValues]) {
        let mut log = lock(&self.handle.log);
        log.calls.push(format!("{kind}:{sql}"));
        log.params.push(params.to_vec());
    }
}

impl Driver for ScriptedDriver {
    fn execute_query(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Box<dyn Statement>, DriverError> {
        self.record_statement("query", sql, params);
        if let Some(err) = self.next_failure() {
            return Err(err);
        }
        let mut script = lock(&self.handle.script);
        let rows = script.rows.get(sql).cloned().unwrap_or_default();
        Ok(Box::new(ScriptedStatement {
            total: rows.len() as u64,
            rows: rows.into(),
            yielded: 0,
            fail_after: script.fail_fetch_after.take(),
            log: Arc::clone(&self.handle.log),
        }))
    }

    fn execute_update(&mut self, sql: &str, params: &[RowValues]) -> Result<u64, DriverError> {
        self.record_statement("update", sql, params);
        if let Some(err) = self.next_failure() {
            return Err(err);
        }
        Ok(lock(&self.handle.script).affected)
    }

    fn last_insert_id(&self) -> Option<i64> {
        lock(&self.handle.script).last_insert_id
    }

    fn begin_transaction(&mut self) -> Result<(), DriverError> {
        self.handle.record("begin".into());
        lock(&self.handle.script).fail_begin.take().map_or(Ok(()), Err)
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        self.handle.record("commit".into());
        lock(&self.handle.script).fail_commit.take().map_or(Ok(()), Err)
    }

    fn roll_back(&mut self) -> Result<(), DriverError> {
        self.handle.record("rollback".into());
        lock(&self.handle.script).fail_rollback.take().map_or(Ok(()), Err)
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn connect(&mut self) -> Result<(), DriverError> {
        self.handle.record("connect".into());
        self.connected = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.handle.record("close".into());
        self.connected = false;
        lock(&self.handle.script).fail_close.take().map_or(Ok(()), Err)
    }

    fn params(&self) -> &ConnectionParams {
        &self.params
    }

    fn kind(&self) -> DatabaseType {
        self.params.driver
    }

    fn database(&self) -> Option<String> {
        self.params.database.clone()
    }

    fn reopen(&self) -> Result<Box<dyn Driver>, DriverError> {
        self.handle.record("reopen".into());
        let driver = ScriptedDriver::with_params(self.params.clone());
        lock(&self.handle.reopened).push(driver.handle());
        Ok(Box::new(driver))
    }
}

/// Streams scripted rows, counting every fetch.
struct ScriptedStatement {
    rows: VecDeque<Row>,
    total: u64,
    yielded: usize,
    fail_after: Option<(usize, DriverError)>,
    log: Arc<Mutex<DriverLog>>,
}

impl Statement for ScriptedStatement {
    fn fetch(&mut self) -> Result<Option<Row>, DriverError> {
        lock(&self.log).fetches += 1;
        if let Some((after, _)) = &self.fail_after
            && *after == self.yielded
            && let Some((_, err)) = self.fail_after.take()
        {
            return Err(err);
        }
        let row = self.rows.pop_front();
        if row.is_some() {
            self.yielded += 1;
        }
        Ok(row)
    }

    fn row_count(&self) -> u64 {
        self.total
    }
}
