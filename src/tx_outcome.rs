/// How a finished transaction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxOutcome {
    Committed,
    RolledBack,
}

/// Lifecycle of a [`crate::Transaction`].
///
/// `execute` may be called again on a finished transaction; it goes back to
/// `Running` and ends in a fresh outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransactionState {
    #[default]
    Idle,
    Running,
    Finished(TxOutcome),
}

impl TransactionState {
    #[must_use]
    pub fn is_committed(self) -> bool {
        self == TransactionState::Finished(TxOutcome::Committed)
    }

    #[must_use]
    pub fn is_rolled_back(self) -> bool {
        self == TransactionState::Finished(TxOutcome::RolledBack)
    }
}
