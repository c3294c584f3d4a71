//! Query execution over scoped connections.
//!
//! Every public call opens one connection scope, runs its statements in
//! order, and releases the connection before returning.

use std::path::Path;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{info, warn};

use super::batch::{Entry, QueryBatch, ResultKey, ResultMap, NO_KEY_QUERIES_KEY, QUERIES_KEY};
use crate::config::ConnectionConfig;
use crate::db::{self, Driver, MySqlDriver, ScopedConnection, Table};
use crate::error::{Result, SqlPackError};
use crate::split;

/// Statement listing the databases visible to the user.
const LIST_DATABASES_SQL: &str = "SHOW DATABASES;";

/// Result name of the column listing query.
const COLUMN_NAMES_KEY: &str = "colnames";

/// Runs introspection, table dumps and custom query batches.
///
/// Identifiers and statements are concatenated into SQL verbatim; callers
/// must not pass untrusted input.
///
/// Cloning is cheap and shares the driver, so a clone can be moved into a
/// [`QueryExecutor::scope`] body to compose calls on one connection.
#[derive(Clone)]
pub struct QueryExecutor {
    config: ConnectionConfig,
    driver: Arc<dyn Driver>,
}

impl QueryExecutor {
    /// Creates an executor that connects through `driver`.
    pub fn new(config: ConnectionConfig, driver: impl Driver + 'static) -> Self {
        Self {
            config,
            driver: Arc::new(driver),
        }
    }

    /// Creates an executor for a MySQL server.
    pub fn mysql(config: ConnectionConfig) -> Self {
        Self::new(config, MySqlDriver)
    }

    /// Connection parameters used for every scope.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Opens a connection scope; see [`db::scope`].
    pub async fn scope<T, F>(&self, body: F) -> Result<T>
    where
        F: for<'c> FnOnce(&'c mut ScopedConnection) -> BoxFuture<'c, Result<T>>,
    {
        db::scope(self.driver.as_ref(), &self.config, body).await
    }

    /// Lists all databases on the server.
    pub async fn list_databases(&self) -> Result<Table> {
        self.scope(|conn| Box::pin(async move { conn.fetch_table(LIST_DATABASES_SQL).await }))
            .await
    }

    /// Lists the tables of `database`.
    ///
    /// Runs on `conn` when given, otherwise in a scope of its own.
    pub async fn list_tables(
        &self,
        database: &str,
        conn: Option<&mut ScopedConnection>,
    ) -> Result<Table> {
        let sql = format!("SHOW TABLES IN {database};");
        match conn {
            Some(conn) => conn.fetch_table(&sql).await,
            None => {
                self.scope(move |conn| Box::pin(async move { conn.fetch_table(&sql).await }))
                    .await
            }
        }
    }

    /// Returns the column names of `table` in `database`.
    pub async fn list_columns(&self, database: &str, table: &str) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT COLUMN_NAME FROM COLUMNS WHERE TABLE_SCHEMA = '{database}' AND TABLE_NAME = '{table}'"
        );
        let batch = QueryBatch::new().named(COLUMN_NAMES_KEY, sql);
        let mut results = self.run_custom("information_schema", batch).await?;

        match results.shift_remove(&ResultKey::name(COLUMN_NAMES_KEY)) {
            Some(Entry::Table(names)) => Ok(names
                .column_values(0)
                .iter()
                .map(|value| value.to_display_string())
                .collect()),
            Some(Entry::Error(message)) => Err(SqlPackError::Query(message)),
            _ => Err(SqlPackError::query("Column listing returned no result")),
        }
    }

    /// Fetches whole tables from `database`, keyed by table name.
    ///
    /// With no table names, every table of the database is fetched. The first
    /// failing table aborts the whole call.
    pub async fn query_tables<S: AsRef<str>>(
        &self,
        database: &str,
        tables: &[S],
    ) -> Result<ResultMap> {
        let database = database.to_string();
        let requested: Vec<String> = tables.iter().map(|t| t.as_ref().to_string()).collect();
        let executor = self.clone();

        self.scope(move |conn| {
            Box::pin(async move {
                conn.use_database(&database).await?;

                let tables = if requested.is_empty() {
                    executor
                        .list_tables(&database, Some(&mut *conn))
                        .await?
                        .column_values(0)
                        .iter()
                        .map(|value| value.to_display_string())
                        .collect()
                } else {
                    requested
                };

                let mut results = ResultMap::new();
                for table in tables {
                    let rows = conn.fetch_table(&format!("SELECT * FROM {table};")).await?;
                    info!("Fetched table {} ({} rows)", table, rows.row_count());
                    results.insert(ResultKey::Name(table), Entry::Table(rows));
                }
                Ok(results)
            })
        })
        .await
    }

    /// Runs every query of `batch` against `database` in one scope.
    ///
    /// A query the server rejects is stored as [`Entry::Error`] and the batch
    /// carries on; connection failures still abort. The query texts are kept
    /// under [`NO_KEY_QUERIES_KEY`] and [`QUERIES_KEY`].
    pub async fn run_custom(&self, database: &str, batch: QueryBatch) -> Result<ResultMap> {
        batch.validate()?;
        let database = database.to_string();

        self.scope(move |conn| {
            Box::pin(async move {
                conn.use_database(&database).await?;

                let mut results = ResultMap::new();
                let mut failures = 0usize;

                if !batch.positional.is_empty() {
                    for (index, sql) in batch.positional.iter().enumerate() {
                        let entry = run_query(conn, &ResultKey::Index(index), sql).await?;
                        failures += usize::from(entry.is_error());
                        results.insert(ResultKey::Index(index), entry);
                    }
                    let texts = batch
                        .positional
                        .iter()
                        .cloned()
                        .map(serde_json::Value::String)
                        .collect();
                    results.insert(
                        ResultKey::name(NO_KEY_QUERIES_KEY),
                        Entry::Raw(serde_json::Value::Array(texts)),
                    );
                }

                if !batch.named.is_empty() {
                    for (name, sql) in &batch.named {
                        let key = ResultKey::name(name.as_str());
                        let entry = run_query(conn, &key, sql).await?;
                        failures += usize::from(entry.is_error());
                        results.insert(key, entry);
                    }
                    let texts = batch
                        .named
                        .iter()
                        .map(|(name, sql)| (name.clone(), serde_json::Value::String(sql.clone())))
                        .collect();
                    results.insert(
                        ResultKey::name(QUERIES_KEY),
                        Entry::Raw(serde_json::Value::Object(texts)),
                    );
                }

                if failures > 0 {
                    warn!(
                        "{} of {} queries failed in the batch on {}",
                        failures,
                        batch.len(),
                        database
                    );
                }
                Ok(results)
            })
        })
        .await
    }

    /// Reads a script, splits it on `delimiter` and runs the statements as
    /// positional queries.
    pub async fn run_script(
        &self,
        database: &str,
        path: &Path,
        delimiter: &str,
    ) -> Result<ResultMap> {
        let statements = split::read_statements(path, delimiter)?;
        self.run_custom(database, QueryBatch::from_statements(statements))
            .await
    }
}

/// Runs one batch query, turning statement errors into entries.
async fn run_query(conn: &mut ScopedConnection, key: &ResultKey, sql: &str) -> Result<Entry> {
    match conn.fetch_table(sql).await {
        Ok(table) => {
            info!("Query {} has been executed", key);
            Ok(Entry::Table(table))
        }
        Err(SqlPackError::Query(message)) => {
            warn!("Error in executing query {}: {}", key, message);
            Ok(Entry::Error(message))
        }
        Err(e) => Err(e),
    }
}
