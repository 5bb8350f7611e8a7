//! Row cursor behavior observed through the driver contract.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use sqlmock::{
    Advance, Connection, Context, Error, MockCatcher, MockResponse, ReplyRow, Rows, SqlValue,
};

fn open_rows(catcher: &MockCatcher, query: &str) -> Box<dyn Rows> {
    let mut conn = catcher.driver().connect("cursor").unwrap();
    let mut stmt = conn.prepare(query).unwrap();
    stmt.query_context(&Context::background(), &[]).unwrap()
}

fn three_people() -> Vec<ReplyRow> {
    vec![
        ReplyRow::new().with("name", "ann").with("age", 31),
        ReplyRow::new().with("name", "bob").with("age", 27),
        ReplyRow::new().with("name", "cy").with("age", 45),
    ]
}

#[test]
fn test_three_rows_then_exhausted() {
    let catcher = MockCatcher::new();
    let _m = catcher.new_mock().with_query("FROM people").with_reply(three_people());

    let mut rows = open_rows(&catcher, "SELECT name, age FROM people");
    assert_eq!(rows.columns(), vec!["name", "age"]);

    let mut dest = vec![SqlValue::Null; 2];
    let mut seen = Vec::new();
    for _ in 0..3 {
        assert_eq!(rows.next(&mut dest).unwrap(), Advance::Row);
        seen.push(dest.clone());
    }
    assert_eq!(rows.next(&mut dest).unwrap(), Advance::Exhausted);

    assert_eq!(
        seen,
        vec![
            vec![SqlValue::from("ann"), SqlValue::Int(31)],
            vec![SqlValue::from("bob"), SqlValue::Int(27)],
            vec![SqlValue::from("cy"), SqlValue::Int(45)],
        ]
    );
}

#[test]
fn test_scan_types_follow_values() {
    let catcher = MockCatcher::new();
    let _m = catcher.new_mock().with_reply(three_people());

    let rows = open_rows(&catcher, "SELECT name, age FROM people");
    assert_eq!(rows.column_scan_type(0).unwrap(), "VARCHAR");
    assert_eq!(rows.column_scan_type(1).unwrap(), "INT");
    assert!(rows.column_scan_type(2).is_err());
}

#[test]
fn test_multiple_result_sets() {
    let catcher = MockCatcher::new();
    let _m = catcher
        .new_mock()
        .with_query("batch")
        .with_reply([ReplyRow::new().with("a", 1), ReplyRow::new().with("a", 2)])
        .with_next_reply([ReplyRow::new().with("b", "x").with("c", true)]);

    let mut rows = open_rows(&catcher, "-- batch\nSELECT a FROM t; SELECT b, c FROM u");
    let mut dest = vec![SqlValue::Null; 2];

    assert!(rows.next(&mut dest).unwrap().is_row());
    assert!(rows.has_next_result_set());

    assert!(rows.next_result_set().unwrap());
    assert_eq!(rows.columns(), vec!["b", "c"]);
    assert_eq!(rows.column_scan_type(1).unwrap(), "BOOL");
    assert!(rows.next(&mut dest).unwrap().is_row());
    assert_eq!(dest, vec![SqlValue::from("x"), SqlValue::Bool(true)]);
    assert_eq!(rows.next(&mut dest).unwrap(), Advance::Exhausted);

    assert!(!rows.has_next_result_set());
    assert!(!rows.next_result_set().unwrap());
}

#[test]
fn test_next_result_set_rewinds_row_pointer() {
    let catcher = MockCatcher::new();
    catcher.attach([MockResponse::new()
        .with_reply([ReplyRow::new().with("a", 1), ReplyRow::new().with("a", 2)])
        .with_next_reply([ReplyRow::new().with("a", 3), ReplyRow::new().with("a", 4)])]);

    let mut rows = open_rows(&catcher, "SELECT a");
    let mut dest = [SqlValue::Null];
    rows.next_result_set().unwrap();
    assert!(rows.next(&mut dest).unwrap().is_row());
    assert_eq!(dest[0], SqlValue::Int(3));
}

#[test]
fn test_fallback_response_is_empty_cursor() {
    let catcher = MockCatcher::new();
    let mut rows = open_rows(&catcher, "SELECT nothing FROM nowhere");
    assert!(rows.columns().is_empty());
    assert_eq!(rows.next(&mut []).unwrap(), Advance::Exhausted);
}

#[test]
fn test_next_after_close_fails() {
    let catcher = MockCatcher::new();
    let _m = catcher.new_mock().with_reply(three_people());
    let mut rows = open_rows(&catcher, "SELECT 1");
    rows.close().unwrap();
    rows.close().unwrap();

    let mut dest = vec![SqlValue::Null; 2];
    let err = rows.next(&mut dest).unwrap_err();
    assert!(matches!(err, Error::CursorClosed));
    assert_eq!(err.to_string(), "cursor is closed");
}

#[test]
fn test_row_error_interrupts_stream() {
    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("disk read failed")]
    struct ReadFailed;

    let catcher = MockCatcher::new();
    let _m = catcher
        .new_mock()
        .with_reply(three_people())
        .with_row_error(1, ReadFailed);

    let mut rows = open_rows(&catcher, "SELECT name FROM people");
    let mut dest = vec![SqlValue::Null; 2];
    assert!(rows.next(&mut dest).unwrap().is_row());

    let err = rows.next(&mut dest).unwrap_err();
    assert_eq!(err.downcast_mocked_ref::<ReadFailed>(), Some(&ReadFailed));

    assert!(rows.next(&mut dest).unwrap().is_row());
    assert_eq!(dest[0], SqlValue::from("cy"));
}

#[test]
fn test_row_error_past_last_row_is_ignored() {
    #[derive(Debug, thiserror::Error)]
    #[error("disk read failed")]
    struct ReadFailed;

    let catcher = MockCatcher::new();
    let _m = catcher
        .new_mock()
        .with_reply([ReplyRow::new().with("id", 1)])
        .with_row_error(3, ReadFailed);

    let mut rows = open_rows(&catcher, "SELECT id FROM t");
    let mut dest = [SqlValue::Null];
    assert_eq!(rows.next(&mut dest).unwrap(), Advance::Row);
    for _ in 0..4 {
        assert_eq!(rows.next(&mut dest).unwrap(), Advance::Exhausted);
    }
}

#[test]
fn test_binary_values_survive_close() {
    let catcher = MockCatcher::new();
    let payload = vec![0x10u8, 0x20, 0x30];
    let _m = catcher
        .new_mock()
        .with_reply([ReplyRow::new().with("blob", payload.clone())]);

    let mut conn = catcher.driver().connect("cursor").unwrap();
    let stmt = conn.prepare_statement("SELECT blob FROM files").unwrap();
    let mut cursor = stmt.execute_read(&[]).unwrap();
    let row = cursor.fetch().unwrap().unwrap();
    cursor.shutdown();

    assert_eq!(row.get::<Vec<u8>>(0).unwrap(), payload);
    assert!(cursor.is_closed());

    // The mock keeps its own copy too.
    let again = conn
        .prepare_statement("SELECT blob FROM files")
        .unwrap()
        .execute_read(&[])
        .unwrap()
        .fetch()
        .unwrap()
        .unwrap();
    assert_eq!(again.get_by_name::<Vec<u8>>("blob").unwrap(), payload);
    Connection::close(&mut conn).unwrap();
}

#[test]
fn test_sparse_rows_fill_null() {
    let catcher = MockCatcher::new();
    let _m = catcher.new_mock().with_reply([
        ReplyRow::new().with("id", 1),
        ReplyRow::new().with("id", 2).with("note", "late column"),
    ]);

    let mut conn = catcher.driver().connect("cursor").unwrap();
    let mut cursor = conn
        .prepare_statement("SELECT id, note FROM t")
        .unwrap()
        .execute_read(&[])
        .unwrap();
    let rows = cursor.fetch_all().unwrap();

    assert_eq!(rows[0].try_get::<String>(1), None);
    assert_eq!(rows[1].try_get_by_name::<String>("Note").as_deref(), Some("late column"));
    Connection::close(&mut conn).unwrap();
}
