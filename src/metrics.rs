//! Process-wide statement counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static STATEMENTS: AtomicU64 = AtomicU64::new(0);
static ELAPSED_NANOS: AtomicU64 = AtomicU64::new(0);

/// Statements executed by every connection in the process.
#[must_use]
pub fn statement_count() -> u64 {
    STATEMENTS.load(Ordering::Relaxed)
}

/// Time spent inside the driver across every connection in the process.
#[must_use]
pub fn total_elapsed() -> Duration {
    Duration::from_nanos(ELAPSED_NANOS.load(Ordering::Relaxed))
}

pub(crate) fn record_statement() {
    STATEMENTS.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn record_elapsed(elapsed: Duration) {
    let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
    // the closure always returns Some, so the update cannot fail
    let _ = ELAPSED_NANOS.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |total| {
        Some(total.saturating_add(nanos))
    });
}
