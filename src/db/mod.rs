//! Database abstraction layer for sql-pack.
//!
//! Provides a trait-based interface for opening connections and running
//! statements, so the MySQL driver and the in-memory mock can be used
//! interchangeably.

mod mock;
mod mysql;
mod scope;
mod types;

pub use mock::{MockDriver, MockStats};
pub use mysql::{MySqlClient, MySqlDriver};
pub use scope::{scope, ScopedConnection};
pub use types::{ColumnInfo, Row, Table, Value};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Opens connections from connection parameters.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Opens a new connection. Failures are `SqlPackError::Connection`.
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn Connection>>;
}

/// A single open connection and its statement cursor.
///
/// All operations are async and return Results with SqlPackError.
#[async_trait]
pub trait Connection: Send {
    /// Runs a statement whose rows, if any, are discarded (e.g. `USE db;`).
    async fn execute(&mut self, sql: &str) -> Result<()>;

    /// Runs a query and collects every row into a table.
    async fn fetch_table(&mut self, sql: &str) -> Result<Table>;

    /// Closes the connection. Calling it again is a no-op.
    async fn close(&mut self) -> Result<()>;
}
