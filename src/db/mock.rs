//! Mock database driver for testing.
//!
//! Provides an in-memory driver that returns canned tables, fails on chosen
//! statements, and records every connect, close and statement it sees.

use super::{ColumnInfo, Connection, Driver, Table, Value};
use crate::config::ConnectionConfig;
use crate::error::{Result, SqlPackError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Counters and statement log shared by a [`MockDriver`] and its connections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockStats {
    /// Successful connects.
    pub connects: usize,
    /// Calls to `close` on a connection that was still open.
    pub closes: usize,
    /// Every statement received, in order.
    pub statements: Vec<String>,
}

#[derive(Default)]
struct MockState {
    tables: HashMap<String, Table>,
    failures: HashMap<String, String>,
    lost_on: HashMap<String, String>,
    refuse: Option<String>,
    stats: MockStats,
}

/// A mock driver that returns predefined results.
#[derive(Clone, Default)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    /// Creates a mock driver with no canned results.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `table` whenever `sql` is fetched.
    pub fn with_table(self, sql: &str, table: Table) -> Self {
        self.lock().tables.insert(normalize(sql), table);
        self
    }

    /// Fails `sql` with a query error carrying `message`.
    pub fn fail_on(self, sql: &str, message: &str) -> Self {
        self.lock()
            .failures
            .insert(normalize(sql), message.to_string());
        self
    }

    /// Fails `sql` with a connection error, as if the link dropped mid-scope.
    pub fn lose_connection_on(self, sql: &str, message: &str) -> Self {
        self.lock()
            .lost_on
            .insert(normalize(sql), message.to_string());
        self
    }

    /// Makes every connect attempt fail with `message`.
    pub fn refuse_connections(self, message: &str) -> Self {
        self.lock().refuse = Some(message.to_string());
        self
    }

    /// Snapshot of the counters and statement log.
    pub fn stats(&self) -> MockStats {
        self.lock().stats.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A poisoned lock only means another test thread panicked mid-update.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn connect(&self, _config: &ConnectionConfig) -> Result<Box<dyn Connection>> {
        let mut state = self.lock();
        if let Some(message) = &state.refuse {
            return Err(SqlPackError::connection(message.clone()));
        }
        state.stats.connects += 1;
        Ok(Box::new(MockConnection {
            state: Arc::clone(&self.state),
            open: true,
        }))
    }
}

struct MockConnection {
    state: Arc<Mutex<MockState>>,
    open: bool,
}

impl MockConnection {
    fn run(&mut self, sql: &str) -> Result<Option<Table>> {
        if !self.open {
            return Err(SqlPackError::connection("Connection already closed"));
        }
        let key = normalize(sql);
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.stats.statements.push(sql.to_string());

        if let Some(message) = state.lost_on.get(&key) {
            return Err(SqlPackError::connection(message.clone()));
        }
        if let Some(message) = state.failures.get(&key) {
            return Err(SqlPackError::query(message.clone()));
        }
        Ok(state.tables.get(&key).cloned())
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        self.run(sql).map(|_| ())
    }

    async fn fetch_table(&mut self, sql: &str) -> Result<Table> {
        match self.run(sql)? {
            Some(table) => Ok(table),
            None if sql.trim().to_uppercase().starts_with("SELECT") => Ok(Table::with_data(
                vec![ColumnInfo::new("result", "TEXT")],
                vec![vec![Value::String(format!("Mock result for: {sql}"))]],
            )),
            None => Ok(Table::new()),
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.open {
            self.open = false;
            self.state
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .stats
                .closes += 1;
        }
        Ok(())
    }
}

fn normalize(sql: &str) -> String {
    sql.trim().trim_end_matches(';').trim().to_string()
}
