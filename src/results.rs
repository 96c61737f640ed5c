//! In-memory materialization of query results.
//!
//! Every cell is stored as text (or `None` for SQL NULL) regardless of the source
//! column type, and tables render as headerless CSV.

mod row;
mod table;

pub use row::ResultRow;
pub use table::ResultTable;
