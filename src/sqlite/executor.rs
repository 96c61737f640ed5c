use rusqlite::Connection;

use crate::error::DataAccessError;
use crate::results::ResultTable;
use crate::types::ParameterBinding;

use super::params::bind_all;
use super::query::build_result_table;

/// Open a transaction unless one is already running; auto-commit never applies.
fn ensure_transaction(conn: &Connection) -> Result<(), DataAccessError> {
    if conn.is_autocommit() {
        conn.execute_batch("BEGIN")?;
    }
    Ok(())
}

/// Compile `sql` into the connection's statement cache and report its placeholder count.
///
/// # Errors
/// Returns `DataAccessError::SqliteError` if the SQL does not compile.
pub(crate) fn prepare(conn: &Connection, sql: &str) -> Result<usize, DataAccessError> {
    let stmt = conn.prepare_cached(sql)?;
    Ok(stmt.parameter_count())
}

/// Execute a SELECT and materialize the rows.
///
/// # Errors
/// Returns `DataAccessError` if binding, execution or result processing fails.
pub(crate) fn query(
    conn: &Connection,
    sql: &str,
    bindings: &[Option<ParameterBinding>],
) -> Result<ResultTable, DataAccessError> {
    ensure_transaction(conn)?;
    let mut stmt = conn.prepare_cached(sql)?;
    bind_all(&mut stmt, bindings)?;
    build_result_table(&mut stmt)
}

/// Execute a DML statement (INSERT, UPDATE, DELETE) and return the affected row count.
///
/// # Errors
/// Returns `DataAccessError` if binding or execution fails.
pub(crate) fn execute(
    conn: &Connection,
    sql: &str,
    bindings: &[Option<ParameterBinding>],
) -> Result<u64, DataAccessError> {
    ensure_transaction(conn)?;
    let mut stmt = conn.prepare_cached(sql)?;
    bind_all(&mut stmt, bindings)?;
    let affected = stmt.raw_execute()?;
    Ok(affected as u64)
}

/// # Errors
/// Returns `DataAccessError::SqliteError` if any statement fails.
pub(crate) fn execute_batch(conn: &Connection, sql: &str) -> Result<(), DataAccessError> {
    ensure_transaction(conn)?;
    conn.execute_batch(sql)?;
    Ok(())
}

/// # Errors
/// Returns `DataAccessError::SqliteError` if `COMMIT` fails.
pub(crate) fn commit(conn: &Connection) -> Result<(), DataAccessError> {
    if !conn.is_autocommit() {
        conn.execute_batch("COMMIT")?;
    }
    Ok(())
}

/// # Errors
/// Returns `DataAccessError::SqliteError` if `ROLLBACK` fails.
pub(crate) fn rollback(conn: &Connection) -> Result<(), DataAccessError> {
    if !conn.is_autocommit() {
        conn.execute_batch("ROLLBACK")?;
    }
    Ok(())
}
