//! Query execution for sql-pack.
//!
//! This module holds the batch and result types and the executor that runs
//! them over scoped connections.

mod batch;
mod executor;

pub use batch::{
    Entry, QueryBatch, ResultKey, ResultMap, NO_KEY_QUERIES_KEY, QUERIES_KEY, RESERVED_NAMES,
};
pub use executor::QueryExecutor;
