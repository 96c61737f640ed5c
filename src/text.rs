//! Quoting and string-join helpers used for CSV rendering.

use std::fmt::Display;

/// Line separator of the host platform.
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
/// Line separator of the host platform.
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// How each element is quoted by [`string_join`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quote {
    /// Elements are written as-is.
    #[default]
    None,
    /// `'value'` with embedded `'` doubled.
    Sql,
    /// `"value"` with embedded `"` doubled.
    Csv,
}

impl Quote {
    fn apply(self, value: &str) -> String {
        match self {
            Quote::None => value.to_owned(),
            Quote::Sql => quote_with(value, '\''),
            Quote::Csv => quote_with(value, '"'),
        }
    }
}

fn quote_with(value: &str, quote: char) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for c in value.chars() {
        if c == quote {
            out.push(quote);
        }
        out.push(c);
    }
    out.push(quote);
    out
}

/// Wrap `value` in single quotes, doubling embedded single quotes. `None` quotes as `''`.
#[must_use]
pub fn quote_sql<T: Display>(value: Option<T>) -> String {
    Quote::Sql.apply(&value.map(|v| v.to_string()).unwrap_or_default())
}

/// Wrap `value` in double quotes, doubling embedded double quotes. `None` quotes as `""`.
#[must_use]
pub fn quote_csv<T: Display>(value: Option<T>) -> String {
    Quote::Csv.apply(&value.map(|v| v.to_string()).unwrap_or_default())
}

/// Join stringified elements with `delimiter`.
///
/// A missing or empty delimiter falls back to `,`. A missing sequence yields `""`.
/// Absent elements render as empty strings before quoting; no delimiter trails the
/// last element.
pub fn string_join<I, T>(delimiter: Option<&str>, items: Option<I>, quote: Quote) -> String
where
    I: IntoIterator<Item = Option<T>>,
    T: Display,
{
    let Some(items) = items else {
        return String::new();
    };
    let delimiter = match delimiter {
        Some(d) if !d.is_empty() => d,
        _ => ",",
    };
    let mut out = String::new();
    for (idx, item) in items.into_iter().enumerate() {
        if idx > 0 {
            out.push_str(delimiter);
        }
        let raw = item.map(|v| v.to_string()).unwrap_or_default();
        out.push_str(&quote.apply(&raw));
    }
    out
}
