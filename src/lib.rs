//! sql-pack - scoped MySQL connections, query batches, and JSON round-tripping
//! of result tables.
//!
//! ```no_run
//! use sql_pack::{codec, ConnectionConfig, QueryBatch, QueryExecutor};
//!
//! # async fn dump_orders() -> sql_pack::Result<()> {
//! let executor = QueryExecutor::mysql(ConnectionConfig::new("localhost", 3306, "root", "secret"));
//!
//! let batch = QueryBatch::new()
//!     .query("SELECT COUNT(*) FROM orders;")
//!     .named("recent", "SELECT * FROM orders ORDER BY created_at DESC LIMIT 10;");
//! let results = executor.run_custom("shop", batch).await?;
//!
//! codec::save(&results, "orders.json")?;
//! let reloaded = codec::load("orders.json")?;
//! # let _ = reloaded;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod query;
pub mod split;

pub use config::{Config, ConnectionConfig, DriverMode};
pub use error::{Result, SqlPackError};
pub use query::{Entry, QueryBatch, QueryExecutor, ResultKey, ResultMap};
pub use split::{read_statements, split_statements, DEFAULT_DELIMITER};
