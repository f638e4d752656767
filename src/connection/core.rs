use std::time::{Duration, Instant};

use super::{Connection, TRACE_TARGET};
use crate::binder::Binder;
use crate::error::{DbalError, DriverError};
use crate::metrics;
use crate::platform::{self, Platform};
use crate::results::ResultSet;
use crate::types::{IntoParams, RowValues};

impl Connection {
    /// Execute a statement and return its rows.
    ///
    /// Parameters may be a sequence of [`RowValues`] or a tuple of values
    /// convertible into them. The statement runs inside the filter chain.
    /// Reads leave [`ResultSet::count`] at 0; use
    /// [`execute_update`](Self::execute_update) for affected rows.
    ///
    /// # Errors
    /// Returns `DbalError::Deadlock` when the driver reports a deadlock code
    /// of this connection's platform, `DbalError::Database` for any other
    /// driver failure, or the error raised by a filter.
    pub fn execute<P: IntoParams>(&mut self, sql: &str, params: P) -> Result<ResultSet, DbalError> {
        let params = params.into_params();
        let Connection {
            driver,
            filter,
            options,
            id,
            statements,
            ..
        } = self;
        let platform = platform::for_database(driver.kind());

        filter.execute(sql, |sql| {
            let started = start_statement(statements);
            let outcome = driver.execute_query(sql, &params);
            let elapsed = finish_statement(started);
            let stmt = outcome.map_err(|err| classify(platform, err))?;
            if options.debug {
                trace(*id, sql, &params, elapsed, stmt.row_count());
            }
            Ok(ResultSet::from_statement(stmt))
        })
    }

    /// Execute a write and return a result carrying the affected row count
    /// and the last insert id.
    ///
    /// # Errors
    /// Same classification as [`execute`](Self::execute).
    pub fn execute_update<P: IntoParams>(
        &mut self,
        sql: &str,
        params: P,
    ) -> Result<ResultSet, DbalError> {
        let params = params.into_params();
        let Connection {
            driver,
            filter,
            options,
            id,
            statements,
            ..
        } = self;
        let platform = platform::for_database(driver.kind());

        filter.execute(sql, |sql| {
            let started = start_statement(statements);
            let outcome = driver.execute_update(sql, &params);
            let elapsed = finish_statement(started);
            let affected = outcome.map_err(|err| classify(platform, err))?;
            if options.debug {
                trace(*id, sql, &params, elapsed, affected);
            }
            Ok(ResultSet::from_update(affected, driver.last_insert_id()))
        })
    }
}

fn start_statement(statements: &mut u64) -> Instant {
    *statements += 1;
    metrics::record_statement();
    Instant::now()
}

fn finish_statement(started: Instant) -> Duration {
    let elapsed = started.elapsed();
    metrics::record_elapsed(elapsed);
    elapsed
}

/// Map a driver failure onto the error taxonomy of `platform`.
pub(crate) fn classify(platform: &dyn Platform, err: DriverError) -> DbalError {
    let DriverError { code, info } = err;
    if platform.is_deadlock(code) {
        DbalError::Deadlock { code, info }
    } else {
        DbalError::Database { code, info }
    }
}

fn trace(connection: u64, sql: &str, params: &[RowValues], elapsed: Duration, rows: u64) {
    let bound = Binder.bind(sql, params).unwrap_or_else(|_| sql.to_string());
    tracing::info!(
        target: TRACE_TARGET,
        connection,
        elapsed_ms = elapsed.as_secs_f64() * 1000.0,
        rows,
        "{bound}"
    );
}
