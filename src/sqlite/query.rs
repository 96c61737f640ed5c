use rusqlite::Statement;
use rusqlite::types::ValueRef;

use crate::error::DataAccessError;
use crate::results::ResultTable;

/// Render one column value the way it appears in a result cell.
///
/// NULL is `None`; every other storage class becomes text. Blobs render as lowercase hex.
pub(crate) fn cell_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(format_real(f)),
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Some(hex::encode(bytes)),
    }
}

fn format_real(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}

/// Run a bound statement and buffer all of its rows.
///
/// Column metadata is read before the first row is stepped; each row is read by
/// position across exactly that many columns.
///
/// # Errors
/// Returns `DataAccessError::SqliteError` if stepping the cursor or reading a column fails.
pub(crate) fn build_result_table(stmt: &mut Statement<'_>) -> Result<ResultTable, DataAccessError> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let mut table = ResultTable::new(column_names);
    let column_count = table.column_count();

    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            cells.push(cell_text(row.get_ref(idx)?));
        }
        table.add_row_values(cells)?;
    }
    Ok(table)
}
