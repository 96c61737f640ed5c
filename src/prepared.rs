use std::fmt;
use std::sync::Arc;

use crate::connection::{DbConnection, StatementHandle};
use crate::error::DataAccessError;
use crate::results::ResultTable;
use crate::types::ParameterBinding;

struct HeldStatement {
    sql: Arc<str>,
    handle: StatementHandle,
    bindings: Vec<Option<ParameterBinding>>,
}

/// One SQL text prepared on a [`DbConnection`], with its positional parameters.
///
/// The handle owns at most one statement at a time. Re-preparing releases the previous
/// statement first, and dropping the handle releases whatever it still holds.
/// [`PreparedExecution::release`] may be called any number of times.
pub struct PreparedExecution {
    connection: Arc<DbConnection>,
    statement: Option<HeldStatement>,
}

impl PreparedExecution {
    /// Prepare `sql` on `connection` and bind `params` to placeholders 1, 2, ... in order.
    ///
    /// # Errors
    /// Returns a statement error if the SQL does not compile, if there are more
    /// parameters than placeholders, or if a value does not fit its declared type.
    pub fn new(
        connection: Arc<DbConnection>,
        sql: &str,
        params: impl IntoIterator<Item = ParameterBinding>,
    ) -> Result<Self, DataAccessError> {
        let mut exec = Self {
            connection,
            statement: None,
        };
        exec.reprepare(sql, params)?;
        Ok(exec)
    }

    /// Point this handle at new SQL, releasing the statement it held.
    ///
    /// On error the handle is left holding nothing.
    ///
    /// # Errors
    /// Same as [`PreparedExecution::new`].
    pub fn reprepare(
        &mut self,
        sql: &str,
        params: impl IntoIterator<Item = ParameterBinding>,
    ) -> Result<(), DataAccessError> {
        self.release();
        let handle = self.connection.prepare(sql)?;
        let parameter_count = handle.parameter_count();
        self.statement = Some(HeldStatement {
            sql: Arc::from(sql),
            handle,
            bindings: vec![None; parameter_count],
        });
        for (idx, param) in params.into_iter().enumerate() {
            if let Err(err) = self.bind(idx + 1, param) {
                self.release();
                return Err(err);
            }
        }
        Ok(())
    }

    /// Bind `param` to the 1-based placeholder `index` of the held statement.
    ///
    /// Returns `Ok(false)` when no statement is held.
    ///
    /// # Errors
    /// Returns `DataAccessError::ParameterError` if `index` is not a placeholder of the
    /// statement or the value does not fit its declared type.
    pub fn bind(&mut self, index: usize, param: ParameterBinding) -> Result<bool, DataAccessError> {
        let Some(held) = self.statement.as_mut() else {
            return Ok(false);
        };
        let count = held.bindings.len();
        let Some(slot) = index.checked_sub(1).and_then(|i| held.bindings.get_mut(i)) else {
            return Err(DataAccessError::ParameterError(format!(
                "parameter index {index} out of range (statement has {count} placeholders)"
            )));
        };
        param.coerced()?;
        tracing::trace!(index, sql_type = param.sql_type().name(), "parameter bound");
        *slot = Some(param);
        Ok(true)
    }

    /// Run the statement as a read and buffer its rows.
    ///
    /// Returns `Ok(None)` when no statement is held.
    ///
    /// # Errors
    /// Returns a statement error if execution fails; the connection and its transaction
    /// are left as they were.
    pub fn query(&self) -> Result<Option<ResultTable>, DataAccessError> {
        let Some(held) = &self.statement else {
            return Ok(None);
        };
        self.connection
            .query(&held.sql, &held.handle, &held.bindings)
            .map(Some)
    }

    /// Run the statement as a write. `true` when at least one row was affected.
    ///
    /// Returns `Ok(false)` when no statement is held.
    ///
    /// # Errors
    /// Returns a statement error if execution fails; the connection and its transaction
    /// are left as they were.
    pub fn execute(&self) -> Result<bool, DataAccessError> {
        let Some(held) = &self.statement else {
            return Ok(false);
        };
        let affected = self
            .connection
            .execute(&held.sql, &held.handle, &held.bindings)?;
        Ok(affected > 0)
    }

    /// Alias of [`PreparedExecution::execute`].
    ///
    /// # Errors
    /// See [`PreparedExecution::execute`].
    pub fn insert(&self) -> Result<bool, DataAccessError> {
        self.execute()
    }

    /// Alias of [`PreparedExecution::execute`].
    ///
    /// # Errors
    /// See [`PreparedExecution::execute`].
    pub fn update(&self) -> Result<bool, DataAccessError> {
        self.execute()
    }

    /// Alias of [`PreparedExecution::execute`].
    ///
    /// # Errors
    /// See [`PreparedExecution::execute`].
    pub fn delete(&self) -> Result<bool, DataAccessError> {
        self.execute()
    }

    /// Close the held statement, if any. Close-time failures are swallowed.
    pub fn release(&mut self) {
        let Some(held) = self.statement.take() else {
            return;
        };
        if let Err(err) = self.connection.release_statement(held.handle) {
            tracing::debug!(error = %err, sql = %held.sql, "ignoring error while closing statement");
        }
    }

    #[must_use]
    pub fn is_prepared(&self) -> bool {
        self.statement.is_some()
    }

    /// SQL text of the held statement.
    #[must_use]
    pub fn sql(&self) -> Option<&str> {
        self.statement.as_ref().map(|held| &*held.sql)
    }

    /// Number of placeholders in the held statement; 0 when nothing is held.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.statement.as_ref().map_or(0, |held| held.bindings.len())
    }

    #[must_use]
    pub fn connection(&self) -> &Arc<DbConnection> {
        &self.connection
    }
}

impl Drop for PreparedExecution {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for PreparedExecution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedExecution")
            .field("sql", &self.sql())
            .field("parameter_count", &self.parameter_count())
            .finish_non_exhaustive()
    }
}
