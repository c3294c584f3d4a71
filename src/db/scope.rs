//! Scoped connections with guaranteed release.
//!
//! [`scope`] opens a connection, lends it to an async body and closes it on
//! every exit path: success, error, or panic.

use super::{Connection, Driver, Table};
use crate::config::ConnectionConfig;
use crate::error::Result;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::{debug, info, warn};

/// An open connection owned by a single [`scope`] call.
pub struct ScopedConnection {
    conn: Box<dyn Connection>,
}

impl ScopedConnection {
    /// Runs a statement through the cursor, discarding any rows.
    pub async fn execute(&mut self, sql: &str) -> Result<()> {
        debug!("execute: {}", sql);
        self.conn.execute(sql).await
    }

    /// Runs a query and returns its rows as a table.
    pub async fn fetch_table(&mut self, sql: &str) -> Result<Table> {
        debug!("fetch: {}", sql);
        self.conn.fetch_table(sql).await
    }

    /// Selects the default database for the rest of the scope.
    pub async fn use_database(&mut self, database: &str) -> Result<()> {
        self.execute(&format!("USE {database};")).await
    }
}

/// Acquires a connection, runs `body` with it and always releases it.
///
/// A failed connect is returned before `body` runs. When `body` fails, its
/// error is returned even if closing also fails. A panic in `body` is
/// re-raised after the connection is closed.
pub async fn scope<T, F>(driver: &dyn Driver, config: &ConnectionConfig, body: F) -> Result<T>
where
    F: for<'c> FnOnce(&'c mut ScopedConnection) -> BoxFuture<'c, Result<T>>,
{
    let conn = driver.connect(config).await?;
    let mut handle = ScopedConnection { conn };
    info!("Connection opened ({})", config.display_string());

    let outcome = AssertUnwindSafe(body(&mut handle)).catch_unwind().await;

    let closed = handle.conn.close().await;
    info!("Connection closed ({})", config.display_string());

    match outcome {
        Ok(Ok(value)) => closed.map(|()| value),
        Ok(Err(e)) => {
            if let Err(close_err) = closed {
                warn!("Failed to close connection after error: {}", close_err);
            }
            Err(e)
        }
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
