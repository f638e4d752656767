use std::sync::Arc;

use rusqlite::Statement;
use rusqlite::types::Value;

use crate::results::Row;
use crate::sqlite::params::Params;
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
/// Returns `rusqlite::Error` if the column cannot be read.
pub fn sqlite_extract_value(row: &rusqlite::Row, idx: usize) -> Result<RowValues, rusqlite::Error> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Blob(b),
    })
}

/// Run a prepared statement and read every row it produces.
///
/// # Errors
/// Returns `rusqlite::Error` if the statement fails while stepping.
pub fn read_rows(stmt: &mut Statement, params: &Params) -> Result<Vec<Row>, rusqlite::Error> {
    let column_names: Arc<Vec<String>> = Arc::new(
        stmt.column_names()
            .iter()
            .map(std::string::ToString::to_string)
            .collect(),
    );
    let col_count = column_names.len();

    let mut rows = Vec::new();
    let mut rows_iter = stmt.query(&params.as_refs()[..])?;
    while let Some(row) = rows_iter.next()? {
        let mut values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            values.push(sqlite_extract_value(row, i)?);
        }
        rows.push(Row::new(Arc::clone(&column_names), values));
    }
    Ok(rows)
}
