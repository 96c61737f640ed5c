//! Single-connection SQL data access.
//!
//! A [`ConnectionManager`] lazily opens one connection (chosen by URL scheme) with
//! auto-commit disabled. [`PreparedExecution`] binds typed positional parameters,
//! and query results come back fully buffered as a [`ResultTable`] that renders as CSV.

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!("enable at least one driver feature: `sqlite` or `postgres`");

pub mod config;
pub mod connection;
pub mod error;
pub mod manager;
pub mod prelude;
pub mod prepared;
pub mod results;
pub mod text;
pub mod types;

#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use config::{ConfigSource, ConnectionOptions, ConnectionOptionsBuilder, DataAccessProperties};
pub use connection::{DatabaseType, DbConnection};
pub use error::{DataAccessError, ErrorKind};
pub use manager::ConnectionManager;
pub use prepared::PreparedExecution;
pub use results::{ResultRow, ResultTable};
pub use types::{ParameterBinding, SqlType, SqlValue};
