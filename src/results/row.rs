use std::fmt;

use crate::text::{Quote, string_join};

/// One fetched record: an ordered, 1-indexed sequence of nullable text cells.
///
/// Out-of-range positions (including 0) never fault: [`ResultRow::get`] answers `None`
/// and [`ResultRow::set`] leaves the row untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultRow {
    cells: Vec<Option<String>>,
}

impl ResultRow {
    #[must_use]
    pub fn new(cells: Vec<Option<String>>) -> Self {
        Self { cells }
    }

    /// Number of cells; 0 once released.
    #[must_use]
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    /// Cell at 1-based `column`, or `None` for SQL NULL and out-of-range positions.
    #[must_use]
    pub fn get(&self, column: usize) -> Option<&str> {
        let idx = column.checked_sub(1)?;
        self.cells.get(idx)?.as_deref()
    }

    /// Overwrite the cell at 1-based `column`.
    ///
    /// Returns `false` and changes nothing when `column` is out of range.
    pub fn set(&mut self, column: usize, value: Option<String>) -> bool {
        let Some(slot) = column
            .checked_sub(1)
            .and_then(|idx| self.cells.get_mut(idx))
        else {
            return false;
        };
        *slot = value;
        true
    }

    /// All cells in column order.
    #[must_use]
    pub fn cells(&self) -> &[Option<String>] {
        &self.cells
    }

    /// Drop every cell. The row reads as empty afterwards.
    pub fn release(&mut self) {
        self.cells.clear();
        self.cells.shrink_to_fit();
    }
}

impl From<Vec<Option<String>>> for ResultRow {
    fn from(cells: Vec<Option<String>>) -> Self {
        Self::new(cells)
    }
}

/// CSV rendering: every field double-quoted, NULL and empty both as `""`.
impl fmt::Display for ResultRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&string_join(
            Some(","),
            Some(self.cells.iter().map(Option::as_deref)),
            Quote::Csv,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> ResultRow {
        ResultRow::new(vec![Some("Alice".into()), None, Some(String::new())])
    }

    #[test]
    fn positions_are_one_based() {
        let r = row();
        assert_eq!(r.size(), 3);
        assert_eq!(r.get(1), Some("Alice"));
        assert_eq!(r.get(2), None);
        assert_eq!(r.get(3), Some(""));
    }

    #[test]
    fn out_of_range_is_quiet() {
        let mut r = row();
        let before = r.clone();
        assert_eq!(r.get(0), None);
        assert_eq!(r.get(r.size() + 1), None);
        assert!(!r.set(0, Some("x".into())));
        assert!(!r.set(4, Some("x".into())));
        assert_eq!(r, before);

        assert!(r.set(2, Some("42".into())));
        assert_eq!(r.get(2), Some("42"));
    }

    #[test]
    fn csv_does_not_distinguish_null_from_empty() {
        assert_eq!(row().to_string(), r#""Alice","","""#);
        let quoted = ResultRow::new(vec![Some(r#"5" disk"#.into())]);
        assert_eq!(quoted.to_string(), r#""5"" disk""#);
    }

    #[test]
    fn released_row_reads_empty() {
        let mut r = row();
        r.release();
        assert_eq!(r.size(), 0);
        assert_eq!(r.get(1), None);
        assert_eq!(r.to_string(), "");
    }
}
