//! Save/load integration tests.
//!
//! Runs batches against the mock driver, writes the results to disk and
//! reads them back.

use pretty_assertions::assert_eq;
use sql_pack::codec;
use sql_pack::db::{ColumnInfo, MockDriver, Table, Value};
use sql_pack::{ConnectionConfig, Entry, QueryBatch, QueryExecutor, ResultKey, ResultMap};
use tempfile::tempdir;

fn customers() -> Table {
    Table::with_data(
        vec![
            ColumnInfo::new("id", "INT"),
            ColumnInfo::new("name", "VARCHAR"),
            ColumnInfo::new("balance", "DOUBLE"),
            ColumnInfo::new("active", "BOOLEAN"),
        ],
        vec![
            vec![Value::Int(1), Value::from("Ada"), Value::Float(10.25), Value::Bool(true)],
            vec![Value::Int(2), Value::from("Grace"), Value::Null, Value::Bool(false)],
        ],
    )
}

fn invoices() -> Table {
    Table::with_data(
        vec![ColumnInfo::new("invoice", "VARCHAR"), ColumnInfo::new("amount", "BIGINT")],
        vec![vec![Value::from("INV-7"), Value::Int(-300)]],
    )
}

#[test]
fn test_tables_survive_save_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("results.json");

    let mut results = ResultMap::new();
    results.insert(ResultKey::name("customers"), Entry::Table(customers()));
    results.insert(ResultKey::name("invoices"), Entry::Table(invoices()));
    results.insert(ResultKey::Index(0), Entry::Table(Table::with_data(
        vec![ColumnInfo::new("n", "INT")],
        vec![],
    )));

    codec::save(&results, &path).unwrap();
    let loaded = codec::load(&path).unwrap();

    assert_eq!(
        loaded.keys().cloned().collect::<Vec<_>>(),
        results.keys().cloned().collect::<Vec<_>>()
    );
    for (key, entry) in &results {
        let original = entry.as_table().unwrap();
        let restored = loaded[key].as_table().unwrap();
        assert!(
            restored.same_content(original),
            "table {key} changed: {restored:?}"
        );
    }
}

#[test]
fn test_numeral_name_comes_back_as_index() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("results.json");

    let mut results = ResultMap::new();
    results.insert(ResultKey::name("2"), Entry::Table(invoices()));

    codec::save(&results, &path).unwrap();
    let loaded = codec::load(&path).unwrap();

    assert!(!loaded.contains_key(&ResultKey::name("2")));
    assert!(loaded[&ResultKey::Index(2)]
        .as_table()
        .unwrap()
        .same_content(&invoices()));
}

#[tokio::test]
async fn test_custom_batch_round_trip() {
    let driver = MockDriver::new()
        .with_table("SELECT * FROM customers;", customers())
        .with_table("SELECT * FROM invoices;", invoices())
        .fail_on("SELECT nonsense;", "ERROR 1054 (42S22): Unknown column 'nonsense'");
    let executor = QueryExecutor::new(ConnectionConfig::default(), driver);

    let batch = QueryBatch::new()
        .query("SELECT * FROM customers;")
        .query("SELECT nonsense;")
        .named("invoices", "SELECT * FROM invoices;");
    let results = executor.run_custom("billing", batch).await.unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("billing.json");
    codec::save(&results, &path).unwrap();
    let loaded = codec::load(&path).unwrap();

    assert_eq!(loaded.len(), results.len());
    assert!(loaded[&ResultKey::Index(0)]
        .as_table()
        .unwrap()
        .same_content(&customers()));
    assert_eq!(loaded[&ResultKey::Index(1)], results[&ResultKey::Index(1)]);
    assert!(loaded[&ResultKey::name("invoices")]
        .as_table()
        .unwrap()
        .same_content(&invoices()));
    assert_eq!(
        loaded[&ResultKey::name("no_key_queries")],
        results[&ResultKey::name("no_key_queries")]
    );
    assert_eq!(
        loaded[&ResultKey::name("queries")],
        results[&ResultKey::name("queries")]
    );
}

#[test]
fn test_saved_file_layout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("layout.json");

    let mut results = ResultMap::new();
    results.insert(ResultKey::Index(0), Entry::Table(invoices()));
    results.insert(ResultKey::Index(1), Entry::Error("ERROR 1064 (42000): oops".into()));
    codec::save(&results, &path).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        raw,
        serde_json::json!({
            "0": "{\"invoice\":{\"0\":\"INV-7\"},\"amount\":{\"0\":-300}}",
            "1": "ERROR 1064 (42000): oops"
        })
    );
}
