//! Splitting SQL scripts into individual statements.

use crate::error::{Result, SqlPackError};
use std::path::Path;

/// Statement delimiter used when none is given.
pub const DEFAULT_DELIMITER: &str = ";";

/// Splits `text` into statements separated by `delimiter`.
///
/// Each fragment is trimmed, empty fragments are dropped, the lines of what
/// remains are joined with a single space, and the delimiter is appended.
/// An empty delimiter leaves the text as a single fragment.
pub fn split_statements(text: &str, delimiter: &str) -> Vec<String> {
    let fragments: Vec<&str> = if delimiter.is_empty() {
        vec![text]
    } else {
        text.split(delimiter).collect()
    };

    fragments
        .into_iter()
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .map(|fragment| {
            let mut statement = fragment.lines().collect::<Vec<_>>().join(" ");
            statement.push_str(delimiter);
            statement
        })
        .collect()
}

/// Reads a script file and splits it with [`split_statements`].
pub fn read_statements(path: &Path, delimiter: &str) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        SqlPackError::io(format!("Failed to read script {}: {e}", path.display()))
    })?;
    Ok(split_statements(&text, delimiter))
}
