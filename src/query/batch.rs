//! Query batches and their result mappings.

use crate::db::Table;
use crate::error::{Result, SqlPackError};
use indexmap::IndexMap;
use std::fmt;

/// Result key holding the texts of the positional queries of a batch.
pub const NO_KEY_QUERIES_KEY: &str = "no_key_queries";

/// Result key holding the texts of the named queries of a batch.
pub const QUERIES_KEY: &str = "queries";

/// Names that cannot be used for queries because results store batch texts under them.
pub const RESERVED_NAMES: [&str; 2] = [NO_KEY_QUERIES_KEY, QUERIES_KEY];

/// Queries to run together in one connection scope.
///
/// Positional queries are named `0, 1, 2, ...` in order; named queries keep
/// the order they were added in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryBatch {
    /// Queries without a name, keyed by position in the results.
    pub positional: Vec<String>,
    /// Queries keyed by a caller-chosen name.
    pub named: IndexMap<String, String>,
}

impl QueryBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a batch of positional queries, e.g. from a split script.
    pub fn from_statements<I, S>(statements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            positional: statements.into_iter().map(Into::into).collect(),
            named: IndexMap::new(),
        }
    }

    /// Appends a positional query.
    pub fn query(mut self, sql: impl Into<String>) -> Self {
        self.positional.push(sql.into());
        self
    }

    /// Adds a named query. Reusing a name replaces the earlier query.
    pub fn named(mut self, name: impl Into<String>, sql: impl Into<String>) -> Self {
        self.named.insert(name.into(), sql.into());
        self
    }

    /// Total number of queries.
    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    /// Returns true if the batch holds no queries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rejects batches that name a query after a reserved result key.
    pub fn validate(&self) -> Result<()> {
        match self
            .named
            .keys()
            .find(|name| RESERVED_NAMES.contains(&name.as_str()))
        {
            Some(name) => Err(SqlPackError::ReservedName(name.clone())),
            None => Ok(()),
        }
    }
}

/// Key of an entry in a [`ResultMap`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResultKey {
    /// Position of an unnamed query.
    Index(usize),
    /// Table name, query name, or reserved key.
    Name(String),
}

impl ResultKey {
    /// Creates a name key.
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Reads a key from a stored document: a plain decimal numeral becomes
    /// an index, even if it was saved as a name. Other spellings of a number
    /// (`"02"`, `"+2"`) stay names, so distinct keys never collide.
    pub fn parse(key: &str) -> Self {
        match key.parse::<usize>() {
            Ok(index) if index.to_string() == key => Self::Index(index),
            _ => Self::Name(key.to_string()),
        }
    }
}

impl fmt::Display for ResultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<usize> for ResultKey {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for ResultKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ResultKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// One entry of a [`ResultMap`].
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// Rows returned by a query.
    Table(Table),
    /// Description of the error a query failed with.
    Error(String),
    /// Any other JSON value, such as the stored query texts.
    Raw(serde_json::Value),
}

impl Entry {
    /// Returns the table, if this entry holds one.
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Self::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Returns the error description, if this entry holds one.
    pub fn as_error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Returns true if this entry is a failed query.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Results of a batch in insertion order.
pub type ResultMap = IndexMap<ResultKey, Entry>;
