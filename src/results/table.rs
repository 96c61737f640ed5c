use std::fmt;
use std::sync::Arc;

use super::row::ResultRow;
use crate::error::DataAccessError;
use crate::text::LINE_SEPARATOR;

/// A fully buffered query result.
///
/// The column count comes from result metadata and stays fixed even when no rows
/// match. Rows are addressed 1-based, like their cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    rows: Vec<ResultRow>,
    column_count: usize,
    /// Column names shared by all rows
    column_names: Arc<Vec<String>>,
}

impl ResultTable {
    /// An empty table shaped by result metadata.
    #[must_use]
    pub fn new(column_names: Vec<String>) -> Self {
        Self {
            rows: Vec::new(),
            column_count: column_names.len(),
            column_names: Arc::new(column_names),
        }
    }

    /// Append one record.
    ///
    /// # Errors
    /// Returns `DataAccessError::ExecutionError` if the record does not have exactly
    /// `column_count` cells.
    pub fn add_row_values(&mut self, cells: Vec<Option<String>>) -> Result<(), DataAccessError> {
        if cells.len() != self.column_count {
            return Err(DataAccessError::ExecutionError(format!(
                "row has {} cells, result has {} columns",
                cells.len(),
                self.column_count
            )));
        }
        self.rows.push(ResultRow::new(cells));
        Ok(())
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row at 1-based `row`, or `None` when out of range.
    #[must_use]
    pub fn row(&self, row: usize) -> Option<&ResultRow> {
        self.rows.get(row.checked_sub(1)?)
    }

    #[must_use]
    pub fn row_mut(&mut self, row: usize) -> Option<&mut ResultRow> {
        self.rows.get_mut(row.checked_sub(1)?)
    }

    pub fn rows(&self) -> std::slice::Iter<'_, ResultRow> {
        self.rows.iter()
    }

    /// Release every row, then the row list itself. The column count is kept.
    pub fn release(&mut self) {
        for row in &mut self.rows {
            row.release();
        }
        self.rows.clear();
        self.rows.shrink_to_fit();
    }
}

impl<'a> IntoIterator for &'a ResultTable {
    type Item = &'a ResultRow;
    type IntoIter = std::slice::Iter<'a, ResultRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Rows as CSV joined by the platform line separator, without a trailing separator.
/// An empty table renders as `""`.
impl fmt::Display for ResultTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, row) in self.rows.iter().enumerate() {
            if idx > 0 {
                f.write_str(LINE_SEPARATOR)?;
            }
            write!(f, "{row}")?;
        }
        Ok(())
    }
}
