//! Query batch integration tests.
//!
//! Runs custom batches, table dumps and scripts against the mock driver.

use sql_pack::db::{ColumnInfo, MockDriver, Table, Value};
use sql_pack::query::{NO_KEY_QUERIES_KEY, QUERIES_KEY};
use sql_pack::{ConnectionConfig, Entry, QueryBatch, QueryExecutor, ResultKey, SqlPackError};

fn executor(driver: &MockDriver) -> QueryExecutor {
    QueryExecutor::new(ConnectionConfig::default(), driver.clone())
}

fn numbers(name: &str, values: &[i64]) -> Table {
    Table::with_data(
        vec![ColumnInfo::new(name, "BIGINT")],
        values.iter().map(|v| vec![Value::Int(*v)]).collect(),
    )
}

#[tokio::test]
async fn test_valid_and_invalid_query_in_one_batch() {
    let driver = MockDriver::new()
        .with_table("SELECT 42 AS answer;", numbers("answer", &[42]))
        .fail_on(
            "SELECT * FROM missing_table;",
            "ERROR 1146 (42S02): Table 'shop.missing_table' doesn't exist",
        );

    let batch = QueryBatch::new()
        .named("answer", "SELECT 42 AS answer;")
        .named("missing", "SELECT * FROM missing_table;");
    let results = executor(&driver).run_custom("shop", batch).await.unwrap();

    assert_eq!(
        results[&ResultKey::name("answer")].as_table(),
        Some(&numbers("answer", &[42]))
    );
    assert_eq!(
        results[&ResultKey::name("missing")],
        Entry::Error("ERROR 1146 (42S02): Table 'shop.missing_table' doesn't exist".to_string())
    );
    assert_eq!(driver.stats().closes, 1);
}

#[tokio::test]
async fn test_positional_names_ignore_named_queries() {
    let driver = MockDriver::new();
    let batch = QueryBatch::new()
        .named("first", "SELECT 'a';")
        .query("SELECT 0;")
        .named("second", "SELECT 'b';")
        .query("SELECT 1;")
        .query("SELECT 2;");

    let results = executor(&driver).run_custom("shop", batch).await.unwrap();

    for index in 0..3 {
        let table = results[&ResultKey::Index(index)].as_table().unwrap();
        assert_eq!(
            table.rows[0][0],
            Value::String(format!("Mock result for: SELECT {index};"))
        );
    }
    assert!(!results.contains_key(&ResultKey::Index(3)));
    assert_eq!(results.len(), 3 + 2 + 2);
}

#[tokio::test]
async fn test_every_query_gets_an_entry() {
    let driver = MockDriver::new()
        .fail_on("SELECT a;", "ERROR 1054 (42S22): Unknown column 'a'")
        .fail_on("SELECT b;", "ERROR 1054 (42S22): Unknown column 'b'");

    let batch = QueryBatch::from_statements(["SELECT a;", "SELECT b;", "SELECT 3;"]);
    let results = executor(&driver).run_custom("shop", batch).await.unwrap();

    let errors = results.values().filter(|entry| entry.is_error()).count();
    assert_eq!(errors, 2);
    assert!(results[&ResultKey::Index(2)].as_table().is_some());
    assert_eq!(
        results[&ResultKey::name(NO_KEY_QUERIES_KEY)],
        Entry::Raw(serde_json::json!(["SELECT a;", "SELECT b;", "SELECT 3;"]))
    );
}

#[tokio::test]
async fn test_reserved_names_are_rejected() {
    let driver = MockDriver::new();
    for reserved in [QUERIES_KEY, NO_KEY_QUERIES_KEY] {
        let batch = QueryBatch::new().named(reserved, "SELECT 1;");
        let err = executor(&driver).run_custom("shop", batch).await.unwrap_err();
        assert!(matches!(err, SqlPackError::ReservedName(_)));
    }
    assert_eq!(driver.stats().connects, 0);
}

#[tokio::test]
async fn test_list_columns_is_a_sequence() {
    let sql = "SELECT COLUMN_NAME FROM COLUMNS WHERE TABLE_SCHEMA = 'db' AND TABLE_NAME = 't'";
    let names = Table::with_data(
        vec![ColumnInfo::new("COLUMN_NAME", "VARCHAR")],
        vec![
            vec![Value::from("id")],
            vec![Value::from("created_at")],
            vec![Value::from("total")],
        ],
    );
    let driver = MockDriver::new().with_table(sql, names);

    let columns: Vec<String> = executor(&driver).list_columns("db", "t").await.unwrap();
    assert_eq!(columns, vec!["id", "created_at", "total"]);
}

#[tokio::test]
async fn test_query_tables_one_scope_for_discovery_and_dump() {
    let driver = MockDriver::new()
        .with_table(
            "SHOW TABLES IN shop;",
            Table::with_data(
                vec![ColumnInfo::new("Tables_in_shop", "VARCHAR")],
                vec![vec![Value::from("users")]],
            ),
        )
        .with_table("SELECT * FROM users;", numbers("id", &[1, 2, 3]));

    let results = executor(&driver)
        .query_tables::<String>("shop", &[])
        .await
        .unwrap();

    assert_eq!(
        results[&ResultKey::name("users")].as_table().unwrap().row_count(),
        3
    );
    let stats = driver.stats();
    assert_eq!(stats.connects, 1);
    assert_eq!(
        stats.statements,
        vec!["USE shop;", "SHOW TABLES IN shop;", "SELECT * FROM users;"]
    );
}

#[tokio::test]
async fn test_script_statements_run_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nightly.sql");
    std::fs::write(
        &path,
        "-- nightly\nSELECT COUNT(*)\n  FROM orders;\n\nSELECT MAX(id) FROM users;\n",
    )
    .unwrap();

    let driver = MockDriver::new();
    let results = executor(&driver)
        .run_script("shop", &path, ";")
        .await
        .unwrap();

    assert_eq!(
        driver.stats().statements,
        vec![
            "USE shop;",
            "-- nightly SELECT COUNT(*)   FROM orders;",
            "SELECT MAX(id) FROM users;",
        ]
    );
    assert_eq!(results.len(), 3);
}
