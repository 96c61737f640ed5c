use tokio::runtime::{Builder, Runtime};
use tokio_postgres::{Client, Config as PgConfig, NoTls};

use crate::error::DataAccessError;

/// A connected client plus the runtime that drives it.
pub(crate) struct PgSession {
    pub(crate) runtime: Runtime,
    pub(crate) client: Client,
    pub(crate) in_transaction: bool,
    /// Set when a failed statement could not be undone and the server-side
    /// transaction only accepts `ROLLBACK`.
    pub(crate) transaction_aborted: bool,
}

/// Connect to `url`. Non-empty `user`/`password` override whatever the URL carries.
///
/// # Errors
/// Returns `DataAccessError::ConfigError` if the URL does not parse and
/// `DataAccessError::ConnectionError` if the server cannot be reached.
pub(crate) fn open(url: &str, user: &str, password: &str) -> Result<PgSession, DataAccessError> {
    let mut pg_config: PgConfig = url
        .parse()
        .map_err(|e| DataAccessError::ConfigError(format!("invalid Postgres URL: {e}")))?;
    if !user.is_empty() {
        pg_config.user(user);
    }
    if !password.is_empty() {
        pg_config.password(password);
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            DataAccessError::ConnectionError(format!("Failed to start Postgres runtime: {e}"))
        })?;

    let (client, connection) = runtime.block_on(pg_config.connect(NoTls)).map_err(|e| {
        DataAccessError::ConnectionError(format!("Failed to connect to Postgres: {e}"))
    })?;
    runtime.spawn(async move {
        if let Err(e) = connection.await {
            tracing::warn!(error = %e, "postgres connection terminated");
        }
    });

    Ok(PgSession {
        runtime,
        client,
        in_transaction: false,
        transaction_aborted: false,
    })
}
