use super::Connection;
use crate::error::DbalError;
use crate::transaction::Transaction;

impl Connection {
    /// # Errors
    /// Returns `DbalError::Driver` if the driver cannot start a transaction.
    pub fn begin_transaction(&mut self) -> Result<(), DbalError> {
        tracing::debug!(connection = self.id, "begin transaction");
        self.driver.begin_transaction()?;
        Ok(())
    }

    /// # Errors
    /// Returns `DbalError::Driver` if the commit fails.
    pub fn commit(&mut self) -> Result<(), DbalError> {
        tracing::debug!(connection = self.id, "commit");
        self.driver.commit()?;
        Ok(())
    }

    /// # Errors
    /// Returns `DbalError::Driver` if the rollback fails.
    pub fn roll_back(&mut self) -> Result<(), DbalError> {
        tracing::debug!(connection = self.id, "rollback");
        self.driver.roll_back()?;
        Ok(())
    }

    /// A transaction bound to this connection, with no callbacks yet.
    pub fn transaction<V: 'static>(&mut self) -> Transaction<'_, V> {
        Transaction::new(self)
    }

    /// A transaction bound to this connection with `f` registered.
    ///
    /// The transaction does not run until [`Transaction::execute`] is called.
    pub fn transaction_with<V, F>(&mut self, f: F) -> Transaction<'_, V>
    where
        V: 'static,
        F: FnMut(&mut Connection) -> Result<V, DbalError> + 'static,
    {
        let mut tx = Transaction::new(self);
        tx.callback(f);
        tx
    }
}
