use std::cell::Cell;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::Connection;
use crate::error::DbalError;

static DEFAULT_CONNECTION: Mutex<Option<Connection>> = Mutex::new(None);

thread_local! {
    // set while this thread holds the default connection inside `with_default`
    static HELD: Cell<bool> = const { Cell::new(false) };
}

/// Clears `HELD` when the run ends, including by unwinding.
struct HeldGuard;

impl HeldGuard {
    fn acquire() -> Result<Self, DbalError> {
        if HELD.with(Cell::get) {
            return Err(DbalError::Connection(
                "default connection is already in use on this thread; \
                 pass the outer connection to the nested transaction"
                    .into(),
            ));
        }
        HELD.with(|held| held.set(true));
        Ok(HeldGuard)
    }
}

impl Drop for HeldGuard {
    fn drop(&mut self) {
        HELD.with(|held| held.set(false));
    }
}

fn lock() -> Result<MutexGuard<'static, Option<Connection>>, DbalError> {
    if HELD.with(Cell::get) {
        return Err(DbalError::Connection(
            "default connection is locked by a running transaction on this thread".into(),
        ));
    }
    Ok(DEFAULT_CONNECTION
        .lock()
        .unwrap_or_else(PoisonError::into_inner))
}

/// Install the process-wide default connection, returning the one it replaces.
///
/// # Errors
/// Returns `DbalError::Connection` when called from inside a run on the
/// default connection.
pub fn install_default(conn: Connection) -> Result<Option<Connection>, DbalError> {
    tracing::debug!(connection = conn.id(), "installed default connection");
    Ok(lock()?.replace(conn))
}

/// Remove and return the default connection.
///
/// # Errors
/// Returns `DbalError::Connection` when called from inside a run on the
/// default connection.
pub fn take_default() -> Result<Option<Connection>, DbalError> {
    Ok(lock()?.take())
}

/// Run `f` against the default connection, holding it for the duration.
///
/// Other threads wait for the run to finish. A nested call from the same
/// thread fails instead of waiting on itself; code running inside `f`
/// already has the connection and should use it directly.
///
/// # Errors
/// Returns `DbalError::Connection` if no default connection is installed or
/// this thread is already inside `with_default`, or whatever `f` returns.
pub fn with_default<R, F>(f: F) -> Result<R, DbalError>
where
    F: FnOnce(&mut Connection) -> Result<R, DbalError>,
{
    let mut guard = lock()?;
    let _held = HeldGuard::acquire()?;
    let conn = guard
        .as_mut()
        .ok_or_else(|| DbalError::Connection("no default connection installed".into()))?;
    f(conn)
}
