// Kept in its own test binary: the counters are process-wide.

use sql_dbal::metrics;
use sql_dbal::prelude::*;
use sql_dbal::test_utils::ScriptedDriver;

#[test]
fn counters_accumulate_across_connections() -> Result<(), Box<dyn std::error::Error>> {
    let statements = metrics::statement_count();
    let elapsed = metrics::total_elapsed();

    let mut a = Connection::new(Box::new(ScriptedDriver::new(DatabaseType::Mysql)));
    let mut b = Connection::new(Box::new(ScriptedDriver::new(DatabaseType::Sqlite)));
    a.execute("SELECT 1", ())?;
    a.execute_update("UPDATE t SET v = 1", ())?;
    b.execute("SELECT 2", ())?;

    assert_eq!(metrics::statement_count(), statements + 3);
    assert!(metrics::total_elapsed() >= elapsed);
    assert_eq!(a.statements_executed(), 2);
    assert_eq!(b.statements_executed(), 1);
    Ok(())
}
