//! Saving and loading result mappings as JSON documents.
//!
//! A document is one JSON object. Tables are stored as strings holding their
//! column-oriented encoding (see [`encode_table`]), errors as plain strings,
//! and raw entries such as the stored query texts as-is.
//!
//! Keys are written as names or stringified indexes. On load, any key that
//! is a plain decimal numeral is read back as [`ResultKey::Index`], so a query
//! *named* `"2"` returns as index 2. Spellings such as `"02"` stay names, so
//! every key in the file keeps its own entry.

mod table;

pub use table::{decode_table, encode_table};

use crate::error::{Result, SqlPackError};
use crate::query::{Entry, ResultKey, ResultMap};
use serde_json::{Map, Value as Json};
use std::path::Path;
use tracing::{debug, warn};

/// Converts a result mapping into its JSON document.
pub fn to_document(results: &ResultMap) -> Result<Json> {
    let mut document = Map::with_capacity(results.len());
    for (key, entry) in results {
        let value = match entry {
            Entry::Table(table) => {
                let encoded = encode_table(table).map_err(|e| match e {
                    SqlPackError::Serialization(msg) => {
                        SqlPackError::serialization(format!("Cannot save table {key}: {msg}"))
                    }
                    other => other,
                })?;
                Json::String(serde_json::to_string(&encoded)?)
            }
            Entry::Error(message) => Json::String(message.clone()),
            Entry::Raw(raw) => raw.clone(),
        };
        if document.insert(key.to_string(), value).is_some() {
            warn!("Result key {} written twice; keeping the later entry", key);
        }
    }
    Ok(Json::Object(document))
}

/// Rebuilds a result mapping from a JSON document.
///
/// Strings that decode as tables become [`Entry::Table`], other strings
/// become [`Entry::Error`], and every other value is kept as [`Entry::Raw`].
pub fn from_document(document: Json) -> Result<ResultMap> {
    let Json::Object(document) = document else {
        return Err(SqlPackError::serialization(
            "Result document must be a JSON object",
        ));
    };

    let mut results = ResultMap::with_capacity(document.len());
    for (key, value) in document {
        let entry = match value {
            Json::String(text) => match serde_json::from_str::<Json>(&text)
                .ok()
                .as_ref()
                .and_then(decode_table)
            {
                Some(table) => Entry::Table(table),
                None => Entry::Error(text),
            },
            raw => Entry::Raw(raw),
        };
        results.insert(ResultKey::parse(&key), entry);
    }
    Ok(results)
}

/// Writes `results` to `path` as a JSON document, replacing any existing file.
pub fn save(results: &ResultMap, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let text = serde_json::to_string(&to_document(results)?)?;
    std::fs::write(path, text)
        .map_err(|e| SqlPackError::io(format!("Failed to write {}: {e}", path.display())))?;
    debug!("Saved {} results to {}", results.len(), path.display());
    Ok(())
}

/// Reads a result mapping saved with [`save`].
pub fn load(path: impl AsRef<Path>) -> Result<ResultMap> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| SqlPackError::io(format!("Failed to read {}: {e}", path.display())))?;
    let results = from_document(serde_json::from_str(&text)?)?;
    debug!("Loaded {} results from {}", results.len(), path.display());
    Ok(results)
}
