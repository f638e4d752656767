//! Interceptors wrapped around statement execution.

use std::fmt;

use crate::error::DbalError;
use crate::results::ResultSet;

/// A statement interceptor.
///
/// Every hook has a no-op default, so a filter only implements what it needs.
pub trait Filter: Send + Sync {
    /// Inspect or rewrite the SQL before it runs. An error aborts the statement.
    ///
    /// # Errors
    /// Returning an error stops execution; the error reaches the caller.
    fn on_query(&self, sql: String) -> Result<String, DbalError> {
        Ok(sql)
    }

    /// Called after the statement produced a result.
    fn on_result(&self, _sql: &str, _result: &ResultSet) {}

    /// Called after the statement failed.
    fn on_error(&self, _sql: &str, _error: &DbalError) {}
}

struct QueryFn<F>(F);

impl<F> Filter for QueryFn<F>
where
    F: Fn(String) -> Result<String, DbalError> + Send + Sync,
{
    fn on_query(&self, sql: String) -> Result<String, DbalError> {
        (self.0)(sql)
    }
}

struct ErrorFn<F>(F);

impl<F> Filter for ErrorFn<F>
where
    F: Fn(&str, &DbalError) + Send + Sync,
{
    fn on_error(&self, sql: &str, error: &DbalError) {
        (self.0)(sql, error);
    }
}

/// Ordered filters applied to every statement a connection runs.
///
/// ```rust
/// use sql_dbal::prelude::*;
///
/// let mut chain = FilterChain::new();
/// chain.on_query(|sql| Ok(format!("/* app */ {sql}")));
///
/// let mut seen = String::new();
/// chain.execute("SELECT 1", |sql| {
///     seen = sql.to_string();
///     Ok(ResultSet::from_update(0, None))
/// })?;
/// assert_eq!(seen, "/* app */ SELECT 1");
/// # Ok::<(), DbalError>(())
/// ```
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, filter: impl Filter + 'static) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Add a filter that only rewrites SQL.
    pub fn on_query<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(String) -> Result<String, DbalError> + Send + Sync + 'static,
    {
        self.add(QueryFn(f))
    }

    /// Add a filter that only observes failures.
    pub fn on_error<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&str, &DbalError) + Send + Sync + 'static,
    {
        self.add(ErrorFn(f))
    }

    pub fn clear(&mut self) -> &mut Self {
        self.filters.clear();
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run `exec` wrapped in the chain.
    ///
    /// Query hooks run first, in order, each receiving the previous hook's
    /// SQL. `exec` then runs with the final SQL, and the result or error
    /// hooks observe the outcome, which is returned unchanged.
    ///
    /// # Errors
    /// Returns an error raised by a query hook (without running `exec`), or
    /// whatever `exec` returns.
    pub fn execute<F>(&self, sql: &str, exec: F) -> Result<ResultSet, DbalError>
    where
        F: FnOnce(&str) -> Result<ResultSet, DbalError>,
    {
        let mut sql = sql.to_string();
        for filter in &self.filters {
            sql = filter.on_query(sql)?;
        }

        let outcome = exec(&sql);
        match &outcome {
            Ok(result) => self.filters.iter().for_each(|f| f.on_result(&sql, result)),
            Err(err) => self.filters.iter().for_each(|f| f.on_error(&sql, err)),
        }
        outcome
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.filters.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    struct Recorder(Arc<Mutex<Vec<String>>>, &'static str);

    impl Filter for Recorder {
        fn on_query(&self, sql: String) -> Result<String, DbalError> {
            self.0.lock().unwrap().push(format!("{}:query", self.1));
            Ok(sql)
        }

        fn on_result(&self, _sql: &str, _result: &ResultSet) {
            self.0.lock().unwrap().push(format!("{}:result", self.1));
        }

        fn on_error(&self, _sql: &str, _error: &DbalError) {
            self.0.lock().unwrap().push(format!("{}:error", self.1));
        }
    }

    #[test]
    fn hooks_run_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = FilterChain::new();
        chain.add(Recorder(log.clone(), "a")).add(Recorder(log.clone(), "b"));

        chain.execute("select 1", |_| Ok(ResultSet::from_update(0, None))).unwrap();
        let err = chain
            .execute("select 1", |_| Err(DbalError::Other("x".into())))
            .unwrap_err();
        assert!(matches!(err, DbalError::Other(_)));

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "a:query", "b:query", "a:result", "b:result", "a:query", "b:query", "a:error",
                "b:error"
            ]
        );
    }

    #[test]
    fn query_hook_can_abort() {
        let mut chain = FilterChain::new();
        chain.on_query(|_| Err(DbalError::Other("denied".into())));
        let mut ran = false;
        let res = chain.execute("delete from t", |_| {
            ran = true;
            Ok(ResultSet::from_update(1, None))
        });
        assert!(res.is_err());
        assert!(!ran);
    }

    #[test]
    fn rewrites_compose() {
        let mut chain = FilterChain::new();
        chain
            .on_query(|sql| Ok(sql.replace("t1", "t2")))
            .on_query(|sql| Ok(format!("{sql} LIMIT 1")));
        let mut seen = String::new();
        chain
            .execute("select * from t1", |sql| {
                seen = sql.to_string();
                Ok(ResultSet::from_update(0, None))
            })
            .unwrap();
        assert_eq!(seen, "select * from t2 LIMIT 1");
        assert_eq!(chain.len(), 2);
        chain.clear();
        assert!(chain.is_empty());
    }
}
