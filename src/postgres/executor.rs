use std::future::Future;

use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Statement};

use crate::error::DataAccessError;
use crate::results::ResultTable;
use crate::types::ParameterBinding;

use super::config::PgSession;
use super::params::{PgParam, convert_all};
use super::query::build_result_table;

const SAVEPOINT: &str = "SAVEPOINT data_access_stmt";
const RELEASE_SAVEPOINT: &str = "RELEASE SAVEPOINT data_access_stmt";
const UNDO_SAVEPOINT: &str =
    "ROLLBACK TO SAVEPOINT data_access_stmt; RELEASE SAVEPOINT data_access_stmt";

const DRIVER_NAME: &str = "tokio-postgres";
/// Kept in step with the `tokio-postgres` requirement in Cargo.toml.
const DRIVER_VERSION: &str = "0.7";

fn as_refs(params: &[PgParam]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| &**p).collect()
}

impl PgSession {
    /// Open a transaction unless one is already running; auto-commit never applies.
    fn ensure_transaction(&mut self) -> Result<(), DataAccessError> {
        if !self.in_transaction {
            self.runtime.block_on(self.client.batch_execute("BEGIN"))?;
            self.in_transaction = true;
        }
        Ok(())
    }

    /// Run one statement inside a savepoint so a failure undoes only that statement.
    ///
    /// The server aborts the whole transaction on any error; rolling back to the
    /// savepoint restores the work done before the statement.
    fn guarded<'c, T, F>(
        &'c mut self,
        run: impl FnOnce(&'c Client) -> F,
    ) -> Result<T, DataAccessError>
    where
        F: Future<Output = Result<T, tokio_postgres::Error>>,
    {
        self.ensure_transaction()?;
        self.runtime.block_on(self.client.batch_execute(SAVEPOINT))?;
        match self.runtime.block_on(run(&self.client)) {
            Ok(value) => {
                self.runtime
                    .block_on(self.client.batch_execute(RELEASE_SAVEPOINT))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(undo_err) = self.runtime.block_on(self.client.batch_execute(UNDO_SAVEPOINT)) {
                    tracing::warn!(error = %undo_err, "could not roll back to statement savepoint");
                    self.transaction_aborted = true;
                }
                Err(err.into())
            }
        }
    }

    /// A statement that fails to parse would abort the open transaction, so preparing
    /// is guarded like execution.
    pub(crate) fn prepare(&mut self, sql: &str) -> Result<Statement, DataAccessError> {
        self.guarded(|client| client.prepare(sql))
    }

    pub(crate) fn query(
        &mut self,
        stmt: &Statement,
        bindings: &[Option<ParameterBinding>],
    ) -> Result<ResultTable, DataAccessError> {
        let params = convert_all(bindings)?;
        let refs = as_refs(&params);
        let rows = self.guarded(|client| client.query(stmt, &refs))?;
        build_result_table(stmt.columns(), &rows)
    }

    pub(crate) fn execute(
        &mut self,
        stmt: &Statement,
        bindings: &[Option<ParameterBinding>],
    ) -> Result<u64, DataAccessError> {
        let params = convert_all(bindings)?;
        let refs = as_refs(&params);
        self.guarded(|client| client.execute(stmt, &refs))
    }

    pub(crate) fn execute_batch(&mut self, sql: &str) -> Result<(), DataAccessError> {
        self.guarded(|client| client.batch_execute(sql))
    }

    /// # Errors
    /// Returns `DataAccessError::ExecutionError` when the server had already aborted the
    /// transaction; its work is rolled back instead of silently discarded by `COMMIT`.
    pub(crate) fn commit(&mut self) -> Result<(), DataAccessError> {
        if self.transaction_aborted {
            self.rollback()?;
            return Err(DataAccessError::ExecutionError(
                "transaction was aborted by an earlier failure and has been rolled back"
                    .to_string(),
            ));
        }
        if self.in_transaction {
            self.runtime.block_on(self.client.batch_execute("COMMIT"))?;
            self.in_transaction = false;
        }
        Ok(())
    }

    pub(crate) fn rollback(&mut self) -> Result<(), DataAccessError> {
        if self.in_transaction {
            self.runtime.block_on(self.client.batch_execute("ROLLBACK"))?;
            self.in_transaction = false;
            self.transaction_aborted = false;
        }
        Ok(())
    }

    /// Product, driver name and driver version for `DbConnection::describe`.
    pub(crate) fn describe(&mut self) -> Result<(String, String, String), DataAccessError> {
        let row = self
            .runtime
            .block_on(self.client.query_one("SHOW server_version", &[]))?;
        let version: String = row.try_get(0)?;
        Ok((
            format!("PostgreSQL {version}"),
            DRIVER_NAME.to_string(),
            DRIVER_VERSION.to_string(),
        ))
    }
}
