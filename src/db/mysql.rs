//! MySQL database client implementation.
//!
//! Provides the `MySqlDriver` and `MySqlClient` types that implement the
//! `Driver` and `Connection` traits for MySQL servers using sqlx.

use crate::config::{ConnectionConfig, DriverMode};
use crate::db::{ColumnInfo, Connection, Driver, Row, Table, Value};
use crate::error::{Result, SqlPackError};
use async_trait::async_trait;
use sqlx::mysql::types::MySqlTime;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::types::chrono::{NaiveDate, NaiveDateTime};
use sqlx::{
    Column as SqlxColumn, Connection as SqlxConnection, Executor, Row as SqlxRow, Statement,
    TypeInfo,
};
use tracing::debug;

/// Opens MySQL connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDriver;

#[async_trait]
impl Driver for MySqlDriver {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn Connection>> {
        let client = MySqlClient::connect(config).await?;
        Ok(Box::new(client))
    }
}

/// A single MySQL connection.
#[derive(Debug)]
pub struct MySqlClient {
    conn: Option<MySqlConnection>,
    mode: DriverMode,
}

impl MySqlClient {
    /// Opens a connection with the given parameters.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let mut options = MySqlConnectOptions::new()
            .host(config.host_or_default())
            .port(config.port);
        if let Some(user) = &config.user {
            options = options.username(user);
        }
        if let Some(password) = &config.password {
            options = options.password(password);
        }

        let conn = MySqlConnection::connect_with(&options)
            .await
            .map_err(|e| map_connection_error(e, config))?;
        debug!("Connected to {} ({} mode)", config.display_string(), config.driver_mode);

        Ok(Self {
            conn: Some(conn),
            mode: config.driver_mode,
        })
    }

    fn conn(&mut self) -> Result<&mut MySqlConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| SqlPackError::connection("Connection already closed"))
    }

    /// Column metadata for a statement, used when it returns no rows.
    async fn describe_columns(&mut self, sql: &str) -> Vec<ColumnInfo> {
        let Ok(conn) = self.conn() else {
            return Vec::new();
        };
        // Best effort: statements that cannot be prepared simply report no columns.
        match conn.prepare(sql).await {
            Ok(statement) => statement
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait]
impl Connection for MySqlClient {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        // Session statements such as USE are not preparable, so always use text.
        self.conn()?
            .execute(sqlx::raw_sql(sql))
            .await
            .map_err(map_execution_error)?;
        Ok(())
    }

    async fn fetch_table(&mut self, sql: &str) -> Result<Table> {
        let mode = self.mode;
        let conn = self.conn()?;
        let result = match mode {
            DriverMode::Text => conn.fetch_all(sqlx::raw_sql(sql)).await,
            DriverMode::Prepared => sqlx::query(sql).fetch_all(conn).await,
        }
        .map_err(map_execution_error)?;

        let columns: Vec<ColumnInfo> = match result.first() {
            Some(first_row) => first_row
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            None => self.describe_columns(sql).await,
        };

        let rows: Vec<Row> = result.iter().map(|row| convert_row(row, mode)).collect();

        Ok(Table { columns, rows })
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close()
                .await
                .map_err(|e| SqlPackError::connection(format!("Failed to close connection: {e}")))?;
        }
        Ok(())
    }
}

/// Converts a sqlx MySqlRow to our Row type.
fn convert_row(row: &MySqlRow, mode: DriverMode) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name(), mode))
        .collect()
}

/// Converts a single column value from a MySqlRow to our Value type.
fn convert_value(row: &MySqlRow, index: usize, type_name: &str, mode: DriverMode) -> Value {
    let type_name = type_name.to_uppercase();

    match type_name.as_str() {
        "NULL" => Value::Null,

        "BOOLEAN" => Value::from(row.try_get::<Option<bool>, _>(index).ok().flatten()),

        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            Value::from(row.try_get::<Option<i64>, _>(index).ok().flatten())
        }

        t if t.ends_with("UNSIGNED") => match row.try_get::<Option<u64>, _>(index) {
            Ok(Some(v)) => i64::try_from(v)
                .map(Value::Int)
                .unwrap_or_else(|_| Value::String(v.to_string())),
            _ => Value::Null,
        },

        "FLOAT" => Value::from(
            row.try_get::<Option<f32>, _>(index)
                .ok()
                .flatten()
                .map(f64::from),
        ),

        "DOUBLE" => Value::from(row.try_get::<Option<f64>, _>(index).ok().flatten()),

        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" | "BIT" => {
            Value::from(row.try_get::<Option<Vec<u8>>, _>(index).ok().flatten())
        }

        // Prepared statements return temporal values packed in binary, so
        // they are decoded through chrono in both modes.
        "DATE" => match row.try_get::<Option<NaiveDate>, _>(index) {
            Ok(v) => Value::from(v.map(format_date)),
            Err(_) => temporal_fallback(row, index, mode),
        },

        "DATETIME" | "TIMESTAMP" => match row.try_get::<Option<NaiveDateTime>, _>(index) {
            Ok(v) => Value::from(v.map(format_datetime)),
            Err(_) => temporal_fallback(row, index, mode),
        },

        "TIME" => match row.try_get::<Option<MySqlTime>, _>(index) {
            Ok(v) => Value::from(v.map(|time| time.to_string())),
            Err(_) => temporal_fallback(row, index, mode),
        },

        // DECIMAL, JSON, ENUM, SET and character types are sent as strings
        // by both protocols.
        _ => Value::from(text_value(row, index)),
    }
}

/// Temporal values chrono cannot represent, such as zero dates.
///
/// The text protocol still carries them as readable strings; the binary
/// protocol does not.
fn temporal_fallback(row: &MySqlRow, index: usize, mode: DriverMode) -> Value {
    match mode {
        DriverMode::Text => Value::from(text_value(row, index)),
        DriverMode::Prepared => Value::Null,
    }
}

fn text_value(row: &MySqlRow, index: usize) -> Option<String> {
    row.try_get_unchecked::<Option<String>, _>(index)
        .ok()
        .flatten()
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn format_datetime(datetime: NaiveDateTime) -> String {
    datetime.format("%Y-%m-%d %H:%M:%S%.f").to_string()
}

/// Splits sqlx failures into statement errors and connection errors.
fn map_execution_error(error: sqlx::Error) -> SqlPackError {
    match error {
        sqlx::Error::Database(_)
        | sqlx::Error::RowNotFound
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. } => SqlPackError::query(format_query_error(error)),
        other => SqlPackError::connection(other.to_string()),
    }
}

/// Formats a server error the way the mysql command line client does.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    match db_error.try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>() {
        Some(my_error) => match my_error.code() {
            Some(state) => format!(
                "ERROR {} ({}): {}",
                my_error.number(),
                state,
                my_error.message()
            ),
            None => format!("ERROR {}: {}", my_error.number(), my_error.message()),
        },
        None => format!("ERROR: {}", db_error.message()),
    }
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> SqlPackError {
    let host = config.host_or_default();
    let port = config.port;
    let user = config.user.as_deref().unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") {
        SqlPackError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("access denied") {
        SqlPackError::connection(format!(
            "Access denied for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("failed to lookup")
        || error_str.contains("name or service not known")
        || error_str.contains("no such host")
    {
        SqlPackError::connection(format!("Unknown host '{host}'."))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        SqlPackError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        SqlPackError::connection(error.to_string())
    }
}
