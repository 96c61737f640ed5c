use rusqlite::{Connection, OpenFlags};

use crate::error::DataAccessError;

const MEMORY_TARGET: &str = ":memory:";

const DRIVER_NAME: &str = "rusqlite";
/// Kept in step with the `rusqlite` requirement in Cargo.toml.
const DRIVER_VERSION: &str = "0.32";

/// Open a `SQLite` database file, or a private in-memory database for `:memory:`.
///
/// `SQLite` has no authentication, so user and password settings do not apply.
///
/// # Errors
/// Returns `DataAccessError::ConnectionError` if the database cannot be opened.
pub(crate) fn open(target: &str) -> Result<Connection, DataAccessError> {
    let conn = if target == MEMORY_TARGET {
        Connection::open_in_memory()
    } else {
        Connection::open_with_flags(
            target,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
    }
    .map_err(|e| {
        DataAccessError::ConnectionError(format!("Failed to open SQLite database {target}: {e}"))
    })?;
    Ok(conn)
}

/// Product, driver name and driver version for `DbConnection::describe`.
pub(crate) fn describe() -> (String, String, String) {
    (
        format!("SQLite {}", rusqlite::version()),
        DRIVER_NAME.to_string(),
        DRIVER_VERSION.to_string(),
    )
}
