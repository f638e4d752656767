use std::cell::RefCell;
use std::rc::Rc;

use sql_dbal::connection;
use sql_dbal::prelude::*;
use sql_dbal::test_utils::{ScriptHandle, ScriptedDriver};

fn scripted() -> (Connection, ScriptHandle) {
    let driver = ScriptedDriver::new(DatabaseType::Mysql);
    let script = driver.handle();
    (Connection::new(Box::new(driver)), script)
}

fn lifecycle_log(tx: &mut Transaction<'_, i64>) -> Rc<RefCell<Vec<String>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    for event in [START_TRANSACTION, COMMIT_TRANSACTION, ROLLBACK_TRANSACTION] {
        let log = Rc::clone(&log);
        tx.events_mut().register(event, move |name, _| {
            log.borrow_mut().push(name.to_string());
            Ok(())
        });
    }
    log
}

#[test]
fn callbacks_run_between_begin_and_commit() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, script) = scripted();
    let mut tx = conn.transaction();
    tx.callback(|conn| {
        conn.execute_update("INSERT INTO t VALUES (1)", ())?;
        Ok(1)
    })
    .callback(|conn| {
        conn.execute_update("INSERT INTO t VALUES (2)", ())?;
        Ok(2)
    });
    let log = lifecycle_log(&mut tx);

    assert_eq!(tx.state(), TransactionState::Idle);
    assert_eq!(tx.execute()?, &[1, 2]);
    assert!(tx.state().is_committed());
    assert_eq!(
        *log.borrow(),
        vec![START_TRANSACTION.to_string(), COMMIT_TRANSACTION.to_string()]
    );
    drop(tx);

    assert_eq!(
        script.log().calls,
        vec![
            "begin",
            "update:INSERT INTO t VALUES (1)",
            "update:INSERT INTO t VALUES (2)",
            "commit",
        ]
    );
    Ok(())
}

#[test]
fn callback_failure_rolls_back_and_returns_the_original_error() {
    let (mut conn, script) = scripted();
    let mut tx = conn.transaction();
    // registered first so its start handler runs ahead of the failing callback
    let log = lifecycle_log(&mut tx);
    tx.callback(|_| Err(DbalError::callback("insufficient funds")));
    let ran_after = Rc::new(RefCell::new(false));
    let flag = Rc::clone(&ran_after);
    tx.callback(move |_| {
        *flag.borrow_mut() = true;
        Ok(0)
    });

    let err = tx.execute().unwrap_err();
    assert_eq!(err.to_string(), "insufficient funds");
    assert!(tx.state().is_rolled_back());
    assert!(!*ran_after.borrow(), "later callbacks do not run");
    assert!(tx.results().is_empty());
    assert_eq!(
        *log.borrow(),
        vec![START_TRANSACTION.to_string(), ROLLBACK_TRANSACTION.to_string()]
    );
    drop(tx);

    let calls = script.log().calls;
    assert_eq!(calls, vec!["begin", "rollback"]);
}

#[test]
fn begin_failure_still_rolls_back() {
    let (mut conn, script) = scripted();
    script.fail_begin(2006, "MySQL server has gone away");
    let mut tx = conn.transaction_with(|_| Ok(1_i64));
    let err = tx.execute().unwrap_err();
    assert!(matches!(err, DbalError::Driver(ref e) if e.code == 2006));
    drop(tx);
    assert_eq!(script.log().calls, vec!["begin", "rollback"]);
}

#[test]
fn commit_failure_rolls_back() {
    let (mut conn, script) = scripted();
    script.fail_commit(1180, "Got error during COMMIT");
    let mut tx = conn.transaction_with(|_| Ok(1_i64));
    let log = lifecycle_log(&mut tx);
    assert_eq!(tx.execute().unwrap_err().code(), Some(1180));
    assert_eq!(
        *log.borrow(),
        vec![START_TRANSACTION.to_string(), ROLLBACK_TRANSACTION.to_string()]
    );
    drop(tx);
    assert_eq!(script.log().calls, vec!["begin", "commit", "rollback"]);
}

#[test]
fn failed_rollback_does_not_mask_the_original_error() {
    let (mut conn, script) = scripted();
    script.fail_rollback(2013, "Lost connection");
    let mut tx = conn.transaction_with(|conn| {
        conn.execute_update("UPDATE t SET v = 1", ())?;
        Err::<i64, _>(DbalError::Other("validation failed".into()))
    });
    tx.events_mut().register(ROLLBACK_TRANSACTION, |_, _| {
        Err(DbalError::Other("rollback handler failed".into()))
    });
    let err = tx.execute().unwrap_err();
    assert!(matches!(err, DbalError::Other(ref m) if m == "validation failed"));
    drop(tx);
    assert_eq!(script.log().count("rollback"), 1);
}

#[test]
fn commit_handler_failure_triggers_rollback() {
    let (mut conn, script) = scripted();
    let mut tx = conn.transaction_with(|_| Ok(1_i64));
    tx.events_mut().register(COMMIT_TRANSACTION, |_, _| {
        Err(DbalError::Other("cache refresh failed".into()))
    });
    assert!(tx.execute().is_err());
    assert!(tx.state().is_rolled_back());
    drop(tx);
    assert_eq!(script.log().calls, vec!["begin", "commit", "rollback"]);
}

#[test]
fn execute_again_clears_results() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, script) = scripted();
    let mut counter = 0;
    let mut tx = conn.transaction_with(move |_| {
        counter += 1;
        Ok(counter)
    });
    assert_eq!(tx.execute()?, &[1]);
    assert_eq!(tx.execute()?, &[2]);
    assert_eq!(tx.into_results(), vec![2]);
    assert_eq!(script.log().count("begin"), 2);
    assert_eq!(script.log().count("commit"), 2);
    Ok(())
}

#[test]
fn callback_with_passes_arguments() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, script) = scripted();
    let mut tx = conn.transaction();
    tx.callback_with((7_i64, "seven".to_string()), |conn, (id, label)| {
        conn.execute_update("INSERT INTO labels VALUES (?, ?)", (*id, label.as_str()))?;
        Ok(*id)
    });
    assert_eq!(tx.execute()?, &[7]);
    drop(tx);
    assert_eq!(
        script.log().params[0],
        vec![RowValues::Int(7), RowValues::Text("seven".into())]
    );
    Ok(())
}

#[test]
fn create_can_run_immediately() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, script) = scripted();
    let tx = Transaction::create(&mut conn, |_| Ok("done"), true)?;
    assert_eq!(tx.results(), &["done"]);
    drop(tx);

    let tx = Transaction::create(&mut conn, |_| Ok("later"), false)?;
    assert_eq!(tx.state(), TransactionState::Idle);
    assert!(tx.results().is_empty());
    drop(tx);
    assert_eq!(script.log().count("begin"), 1);
    Ok(())
}

#[test]
fn default_connection_transactions() -> Result<(), Box<dyn std::error::Error>> {
    let err = Transaction::<i64>::create_default(|_| Ok(1), true).unwrap_err();
    assert!(matches!(err, DbalError::Connection(_)));

    let (conn, script) = scripted();
    let id = conn.id();
    assert!(connection::install_default(conn)?.is_none());

    let tx = Transaction::create_default(
        |conn| {
            conn.execute_update("DELETE FROM sessions", ())?;
            Ok(conn.id())
        },
        true,
    )?;
    assert_eq!(tx.results(), &[id]);

    let mut tx = Transaction::with_default();
    tx.callback(|_| Ok(0_u64));
    tx.execute()?;

    let conn = connection::take_default()?.ok_or("default connection missing")?;
    assert_eq!(conn.id(), id);
    assert_eq!(script.log().count("commit"), 2);
    Ok(())
}
