//! Column-oriented JSON encoding of tables.
//!
//! A table becomes `{"<column>": {"<row>": <value>, ...}, ...}` with columns
//! in table order and rows numbered from zero.

use crate::db::{ColumnInfo, Row, Table, Value};
use crate::error::{Result, SqlPackError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Number, Value as Json};

/// Encodes a table as a column-oriented JSON object.
///
/// Binary values become base64 strings and non-finite floats become `null`.
/// Fails on duplicate column names, which a JSON object cannot hold.
pub fn encode_table(table: &Table) -> Result<Json> {
    let mut columns = Map::new();
    for (index, column) in table.columns.iter().enumerate() {
        let cells: Map<String, Json> = table
            .rows
            .iter()
            .enumerate()
            .map(|(row, values)| {
                let cell = values.get(index).map(value_to_json).unwrap_or(Json::Null);
                (row.to_string(), cell)
            })
            .collect();
        if columns.insert(column.name.clone(), Json::Object(cells)).is_some() {
            return Err(SqlPackError::serialization(format!(
                "Column '{}' appears more than once; alias it to save the table",
                column.name
            )));
        }
    }
    Ok(Json::Object(columns))
}

/// Decodes a column-oriented JSON object back into a table.
///
/// Returns `None` unless `json` is an object of objects keyed by row
/// numbers. Each row number must be written canonically and be lower than
/// the number of cells in its column. Cells missing at the end of a shorter
/// column are `Null`. Column types are inferred from the first non-null
/// value, since the encoding does not carry them.
pub fn decode_table(json: &Json) -> Option<Table> {
    let columns = json.as_object()?;

    let mut cells: Vec<Vec<(usize, &Json)>> = Vec::with_capacity(columns.len());
    let mut row_count = 0;
    for column in columns.values() {
        let column = column.as_object()?;
        let mut column_cells = Vec::with_capacity(column.len());
        for (key, cell) in column {
            let row = parse_row_index(key)?;
            if row >= column.len() {
                return None;
            }
            row_count = row_count.max(row.checked_add(1)?);
            column_cells.push((row, cell));
        }
        cells.push(column_cells);
    }

    let mut rows: Vec<Row> = vec![vec![Value::Null; columns.len()]; row_count];
    let mut infos = Vec::with_capacity(columns.len());

    for (index, (name, column_cells)) in columns.keys().zip(cells).enumerate() {
        let data_type = column_cells
            .iter()
            .map(|(_, cell)| *cell)
            .find(|cell| !cell.is_null())
            .map(json_type_name)
            .unwrap_or("null");
        infos.push(ColumnInfo::new(name.clone(), data_type));

        for (row, cell) in column_cells {
            rows[row][index] = json_to_value(cell);
        }
    }

    Some(Table::with_data(infos, rows))
}

fn parse_row_index(key: &str) -> Option<usize> {
    let row: usize = key.parse().ok()?;
    (row.to_string() == key).then_some(row)
}

fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::Number((*i).into()),
        Value::Float(f) => Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
        Value::String(s) => Json::String(s.clone()),
        Value::Bytes(bytes) => Json::String(STANDARD.encode(bytes)),
    }
}

fn json_to_value(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
        },
        Json::String(s) => Value::String(s.clone()),
        nested => Value::String(nested.to_string()),
    }
}

fn json_type_name(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(n) if n.is_i64() => "integer",
        Json::Number(_) => "double",
        Json::String(_) => "text",
        Json::Array(_) | Json::Object(_) => "json",
    }
}
