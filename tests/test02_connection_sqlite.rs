#![cfg(feature = "sqlite")]

use std::sync::{Arc, Mutex};

use sql_dbal::params;
use sql_dbal::prelude::*;
use tempfile::TempDir;

fn open(dir: &TempDir) -> Result<Connection, DbalError> {
    let path = dir.path().join("app.db");
    let mut conn = SqliteOptionsBuilder::new(path.to_string_lossy()).connect()?;
    conn.execute_update(
        "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, active BOOLEAN)",
        (),
    )?;
    Ok(conn)
}

#[test]
fn update_path_reports_affected_rows_and_insert_id() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut conn = open(&dir)?;

    let rs = conn.execute_update(
        "INSERT INTO users (name, active) VALUES (?, ?)",
        ("alice", true),
    )?;
    assert_eq!(rs.affected_rows(), 1);
    assert_eq!(rs.count(), 1);
    assert_eq!(rs.last_insert_id(), Some(1));

    conn.execute_update(
        "INSERT INTO users (name, active) VALUES (?, ?)",
        params!["bob", false],
    )?;
    let rs = conn.execute_update("UPDATE users SET active = ?", (true,))?;
    assert_eq!(rs.affected_rows(), 2);
    Ok(())
}

#[test]
fn both_parameter_forms_bind_the_same() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut conn = open(&dir)?;
    conn.execute_update("INSERT INTO users (name) VALUES (?)", ("carol",))?;

    let sql = "SELECT name FROM users WHERE name = ?1 AND id = ?2";
    let by_tuple = conn.execute(sql, ("carol", 1_i64))?.scalar("name")?;
    let by_vec = conn
        .execute(sql, vec![RowValues::Text("carol".into()), RowValues::Int(1)])?
        .scalar(0_usize)?;
    assert_eq!(by_tuple, Some(RowValues::Text("carol".into())));
    assert_eq!(by_tuple, by_vec);
    Ok(())
}

#[test]
fn failures_are_classified_with_native_codes() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut conn = open(&dir)?;

    let err = conn.execute("SELEC nonsense", ()).unwrap_err();
    assert!(matches!(err, DbalError::Database { code: 1, .. }), "{err:?}");

    conn.execute_update("INSERT INTO users (id, name) VALUES (1, 'a')", ())?;
    let err = conn
        .execute_update("INSERT INTO users (id, name) VALUES (1, 'b')", ())
        .unwrap_err();
    // SQLITE_CONSTRAINT_PRIMARYKEY
    assert_eq!(err.code(), Some(1555));
    assert!(!err.is_deadlock());
    Ok(())
}

#[test]
fn tables_resolve_against_the_selected_database() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut conn = open(&dir)?;
    assert_eq!(conn.selected_database().as_deref(), Some("main"));

    let mut users = conn.table("users");
    assert_eq!(users.name().to_string(), "main.users");
    assert!(users.exists()?);
    let rs = users.insert(&[("name", "dave".into()), ("active", true.into())])?;
    assert_eq!(rs.affected_rows(), 1);
    users.truncate()?;

    assert_eq!(
        conn.execute("SELECT COUNT(*) FROM users", ())?.scalar(0_usize)?,
        Some(RowValues::Int(0))
    );
    assert!(!conn.table("missing").exists()?);
    assert!(conn.table("main.users").exists()?);
    Ok(())
}

#[test]
fn database_selection_is_validated_and_platform_aware() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut conn = open(&dir)?;

    let err = conn.select_database("app; DROP TABLE users").unwrap_err();
    assert!(matches!(err, DbalError::Config(_)));
    let err = conn.select_database("app").unwrap_err();
    assert!(err.is_unsupported());
    assert_eq!(conn.charset(), "utf8");
    assert_eq!(conn.platform().name(), "sqlite");
    Ok(())
}

#[test]
fn filters_wrap_every_statement() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut conn = open(&dir)?;
    let failures = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&failures);

    conn.filter_chain_mut()
        .on_query(|sql| Ok(sql.replace("FROM people", "FROM users")))
        .on_error(move |sql, err| sink.lock().unwrap().push(format!("{sql}: {}", err.code().unwrap_or(0))));

    conn.execute_update("INSERT INTO users (name) VALUES ('erin')", ())?;
    let name = conn.execute("SELECT name FROM people", ())?.scalar(0_usize)?;
    assert_eq!(name, Some(RowValues::Text("erin".into())));

    assert!(conn.execute("SELECT nope FROM people", ()).is_err());
    assert_eq!(*failures.lock().unwrap(), vec!["SELECT nope FROM users: 1".to_string()]);
    Ok(())
}

#[test]
fn statement_counter_and_debug_trace() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let dir = tempfile::tempdir()?;
    let mut conn = open(&dir)?;
    let before = conn.statements_executed();

    conn.set_debug(true);
    assert!(conn.is_debug());
    conn.execute("SELECT ? AS greeting", ("hello",))?;
    let _ = conn.execute("SELECT broken(", ());
    assert_eq!(conn.statements_executed(), before + 2);
    Ok(())
}

#[test]
fn reconnect_and_close() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut conn = open(&dir)?;
    conn.execute_update("INSERT INTO users (name) VALUES ('frank')", ())?;

    conn.connect()?;
    assert!(conn.is_connected());
    let count = conn.execute("SELECT COUNT(*) FROM users", ())?.scalar(0_usize)?;
    assert_eq!(count, Some(RowValues::Int(1)));

    conn.close()?;
    assert!(!conn.is_connected());
    assert!(conn.execute("SELECT 1", ()).is_err());
    Ok(())
}

#[test]
fn open_dispatches_on_driver_type() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("params.db");
    let json = format!(
        r#"{{"driver": "sqlite", "dsn": {}, "wal": true}}"#,
        serde_json_string(&path.to_string_lossy())
    );
    let mut conn = Connection::open(ConnectionParams::from_json(&json)?)?;
    assert_eq!(
        conn.execute("PRAGMA journal_mode", ())?.scalar(0_usize)?,
        Some(RowValues::Text("wal".into()))
    );

    let err = Connection::open(ConnectionParams::new(DatabaseType::Mysql, "mysql://localhost/app"))
        .unwrap_err();
    assert!(matches!(err, DbalError::Config(_)));
    Ok(())
}

fn serde_json_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
