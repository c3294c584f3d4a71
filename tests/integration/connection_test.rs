//! Connection integration tests.
//!
//! Tests scoped acquisition and release, plus live MySQL connectivity when
//! DATABASE_URL is set.

use sql_pack::config::ConnectionConfig;
use sql_pack::db::{self, MockDriver, MySqlDriver};
use sql_pack::{QueryExecutor, SqlPackError};

/// Helper to get test database URL from environment.
fn get_test_database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok()
}

fn local_config() -> ConnectionConfig {
    ConnectionConfig::new("localhost", 3306, "root", "secret")
}

#[tokio::test]
async fn test_every_scope_closes_exactly_once() {
    let driver = MockDriver::new().fail_on("SELECT boom;", "ERROR 1064 (42000): boom");
    let executor = QueryExecutor::new(local_config(), driver.clone());

    executor.list_databases().await.unwrap();
    let failed = executor
        .scope(|conn| Box::pin(async move { conn.fetch_table("SELECT boom;").await }))
        .await;
    assert!(failed.is_err());
    executor.list_tables("shop", None).await.unwrap();

    let stats = driver.stats();
    assert_eq!(stats.connects, 3);
    assert_eq!(stats.closes, 3);
}

#[tokio::test]
async fn test_refused_connection_propagates() {
    let driver = MockDriver::new().refuse_connections("Cannot connect to localhost:3306");
    let executor = QueryExecutor::new(local_config(), driver.clone());

    let err = executor.list_databases().await.unwrap_err();
    assert!(matches!(err, SqlPackError::Connection(_)));
    assert_eq!(err.category(), "Connection Error");
    assert_eq!(driver.stats().closes, 0);
}

#[tokio::test]
async fn test_free_scope_function() {
    let driver = MockDriver::new();
    let rows = db::scope(&driver, &local_config(), |conn| {
        Box::pin(async move {
            let table = conn.fetch_table("SELECT 'hi';").await?;
            Ok(table.row_count())
        })
    })
    .await
    .unwrap();

    assert_eq!(rows, 1);
    assert_eq!(driver.stats().closes, 1);
}

#[tokio::test(flavor = "current_thread")]
async fn test_mysql_connect_with_unused_port() {
    let config = ConnectionConfig::new("127.0.0.1", 59999, "root", "secret");
    let executor = QueryExecutor::new(config, MySqlDriver);

    let err = executor.list_databases().await.unwrap_err();
    assert!(matches!(err, SqlPackError::Connection(_)));
}

#[tokio::test]
async fn test_mysql_list_databases() {
    let Some(url) = get_test_database_url() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let config = ConnectionConfig::from_connection_string(&url).unwrap();
    let executor = QueryExecutor::mysql(config);

    let databases = executor.list_databases().await.unwrap();
    let names: Vec<String> = databases
        .column_values(0)
        .iter()
        .map(|v| v.to_display_string())
        .collect();
    assert!(names.contains(&"information_schema".to_string()));
}

#[tokio::test]
async fn test_mysql_list_columns_of_catalog_table() {
    let Some(url) = get_test_database_url() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let config = ConnectionConfig::from_connection_string(&url).unwrap();
    let executor = QueryExecutor::mysql(config);

    let columns = executor
        .list_columns("information_schema", "SCHEMATA")
        .await
        .unwrap();
    assert!(columns.iter().any(|c| c == "SCHEMA_NAME"));
}
