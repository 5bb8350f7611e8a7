//! Driver registry, connection and transaction tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use sqlmock::{
    Capabilities, Connection, ConnectionState, Database, Driver, Error, ExecResult, MockCatcher,
    ReplyRow, Rows, SqlValue, Transaction,
};

// =============================================================================
// Driver Registry
// =============================================================================

#[test]
fn test_open_caches_database_by_name() {
    let catcher = MockCatcher::new();
    let driver = catcher.driver();

    let first = driver.connect("inventory").unwrap();
    let second = driver.connect("inventory").unwrap();
    assert!(first.database().unwrap().ptr_eq(&second.database().unwrap()));
    assert_eq!(driver.database("inventory").unwrap().name(), "inventory");
    assert!(driver.database("billing").is_none());
}

#[test]
fn test_open_and_close_counts() {
    let driver = MockCatcher::new().driver();
    let mut a = driver.open("db").unwrap();
    let b = driver.open("db").unwrap();
    assert_eq!(driver.open_count(), 2);
    assert_eq!(driver.close_count(), 0);

    a.close().unwrap();
    drop(b);
    assert_eq!(driver.close_count(), 2);
}

#[test]
fn test_capabilities_are_advertised() {
    let mut conn = MockCatcher::new().driver().open("db").unwrap();
    let caps = conn.capabilities();
    assert!(caps.contains(Capabilities::CONTEXT_PREPARE | Capabilities::TRANSACTIONS));
    assert!(caps.contains(Capabilities::MULTI_RESULT_SETS | Capabilities::COLUMN_SCAN_TYPE));
    conn.close().unwrap();
}

// =============================================================================
// Bad Connections
// =============================================================================

#[test]
fn test_bad_database_fails_begin_and_prepare() {
    let driver = MockCatcher::new().driver();
    let conn = driver.connect("flaky").unwrap();
    driver.database("flaky").unwrap().set_bad_connection(true);

    assert!(conn.begin_transaction().unwrap_err().is_bad_connection());
    assert!(conn.prepare_statement("SELECT 1").unwrap_err().is_bad_connection());

    driver.database("flaky").unwrap().set_bad_connection(false);
    assert!(conn.prepare_statement("SELECT 1").is_ok());
}

// =============================================================================
// Transactions
// =============================================================================

#[test]
fn test_second_begin_fails_until_commit() {
    let mut conn = MockCatcher::new().driver().open("tx").unwrap();
    let tx = conn.begin().unwrap();
    let err = conn.begin().err().unwrap();
    assert!(matches!(err, Error::Transaction(ref msg) if msg.contains("already in a transaction")));

    tx.commit().unwrap();
    conn.begin().unwrap().rollback().unwrap();
}

#[test]
fn test_state_transitions() {
    let conn = MockCatcher::new().driver().connect("tx").unwrap();
    assert_eq!(conn.state(), ConnectionState::Ready);
    let tx = conn.begin_transaction().unwrap();
    assert!(conn.in_transaction());
    tx.rollback().unwrap();
    assert_eq!(conn.state(), ConnectionState::Ready);
    conn.disconnect();
    assert_eq!(conn.state(), ConnectionState::Closed);
    assert!(!conn.state().is_usable());
}

#[test]
fn test_closed_connection_rejects_everything() {
    let mut conn = MockCatcher::new().driver().open("closed").unwrap();
    conn.close().unwrap();
    assert!(matches!(conn.prepare("SELECT 1").err(), Some(Error::ConnectionClosed)));
    assert!(matches!(conn.begin().err(), Some(Error::ConnectionClosed)));
}

// =============================================================================
// Host Table and Database Handle
// =============================================================================

#[test]
fn test_database_round_trip_through_driver_table() {
    let catcher = MockCatcher::new();
    assert!(catcher.register_as("driver-tests"));
    let _select = catcher
        .new_mock()
        .with_query("SELECT name FROM users WHERE age")
        .with_args([27])
        .with_reply([ReplyRow::new().with("name", "FirstLast")]);
    let _insert = catcher.new_mock().with_query("INSERT INTO users").with_id(64);

    let mut db = Database::open("driver-tests", "app").unwrap();

    let mut rows = db
        .query("SELECT name FROM users WHERE age=?", &[&27i64])
        .unwrap();
    let mut dest = vec![SqlValue::Null];
    assert!(rows.next(&mut dest).unwrap().is_row());
    assert_eq!(dest[0], SqlValue::from("FirstLast"));

    let result = db
        .execute("INSERT INTO users (name) VALUES (?)", &[&"ann"])
        .unwrap();
    assert_eq!(result.last_insert_id().unwrap(), 64);

    db.close().unwrap();
    assert_eq!(catcher.driver().close_count(), 1);
}

#[test]
fn test_database_open_unknown_driver() {
    let err = Database::open("driver-tests-nope", "x").unwrap_err();
    assert!(matches!(err, Error::UnknownDriver(_)));
    assert!(err.to_string().contains("forgotten register"));
}

#[test]
fn test_database_rejects_unconvertible_argument() {
    let catcher = MockCatcher::new();
    let mut db = Database::from_connection(Box::new(catcher.driver().connect("x").unwrap()));
    let err = db.execute("UPDATE t SET n=?", &[&u64::MAX]).err().unwrap();
    assert!(matches!(err, Error::Type(_)));
}
