//! Error types for sql-pack.
//!
//! Defines the main error enum used throughout the crate.

use thiserror::Error;

/// Main error type for sql-pack operations.
#[derive(Error, Debug)]
pub enum SqlPackError {
    /// Database connection errors (host unreachable, access denied, lost link, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors (syntax errors, unknown tables, decode failures, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Configuration errors (invalid config file, bad connection string, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A query batch used a name reserved for the stored query texts.
    #[error("Query name '{0}' is reserved")]
    ReservedName(String),

    /// JSON encoding or decoding of a result document failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File system errors while reading scripts or result documents.
    #[error("I/O error: {0}")]
    Io(String),
}

impl SqlPackError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a serialization error with the given message.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Creates an I/O error with the given message.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Returns true for errors raised by the server while executing a statement.
    pub fn is_query_error(&self) -> bool {
        matches!(self, Self::Query(_))
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Config(_) => "Configuration Error",
            Self::ReservedName(_) => "Reserved Name",
            Self::Serialization(_) => "Serialization Error",
            Self::Io(_) => "I/O Error",
        }
    }
}

impl From<serde_json::Error> for SqlPackError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type alias using SqlPackError.
pub type Result<T> = std::result::Result<T, SqlPackError>;
