//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types
//! to make it easier to get started with the library.

pub use crate::config::{ConfigSource, ConnectionOptions, DataAccessProperties};
pub use crate::connection::{DatabaseType, DbConnection};
pub use crate::error::{DataAccessError, ErrorKind};
pub use crate::manager::ConnectionManager;
pub use crate::prepared::PreparedExecution;
pub use crate::results::{ResultRow, ResultTable};
pub use crate::text::{LINE_SEPARATOR, Quote, string_join};
pub use crate::types::{ParameterBinding, SqlType, SqlValue};
