use thiserror::Error;

#[cfg(feature = "sqlite")]
use rusqlite;
#[cfg(feature = "postgres")]
use tokio_postgres;

/// Coarse error classes callers branch on.
///
/// Resource-release failures are absent on purpose: they are swallowed where they
/// happen and never reach a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Property source missing, unreadable or malformed.
    Configuration,
    /// No driver registered for the configured URL.
    Driver,
    /// The connection could not be opened or has been lost.
    Connection,
    /// Preparing, binding or executing a statement failed.
    Statement,
}

#[derive(Debug, Error)]
pub enum DataAccessError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "postgres")]
    #[error("{}", postgres_message(.0))]
    PostgresError(#[from] tokio_postgres::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Driver error: {0}")]
    DriverError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter binding error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),
}

/// Server-side failures carry their severity, SQLSTATE and message; `tokio_postgres`
/// alone only prints `db error` for them.
#[cfg(feature = "postgres")]
fn postgres_message(err: &tokio_postgres::Error) -> String {
    match err.as_db_error() {
        Some(db) => {
            let mut msg = format!("{} {}: {}", db.severity(), db.code().code(), db.message());
            if let Some(detail) = db.detail() {
                msg.push_str(" (");
                msg.push_str(detail);
                msg.push(')');
            }
            msg
        }
        None => err.to_string(),
    }
}

impl DataAccessError {
    /// Classify this error into the taxonomy surfaced to callers.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigError(_) => ErrorKind::Configuration,
            Self::DriverError(_) => ErrorKind::Driver,
            Self::ConnectionError(_) => ErrorKind::Connection,
            #[cfg(feature = "sqlite")]
            Self::SqliteError(_) => ErrorKind::Statement,
            #[cfg(feature = "postgres")]
            Self::PostgresError(err) if err.is_closed() => ErrorKind::Connection,
            #[cfg(feature = "postgres")]
            Self::PostgresError(_) => ErrorKind::Statement,
            Self::ParameterError(_) | Self::ExecutionError(_) => ErrorKind::Statement,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_variant() {
        assert_eq!(
            DataAccessError::ConfigError("x".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(DataAccessError::DriverError("x".into()).kind(), ErrorKind::Driver);
        assert_eq!(
            DataAccessError::ParameterError("x".into()).kind(),
            ErrorKind::Statement
        );
        assert_eq!(
            DataAccessError::ConfigError("missing".into()).to_string(),
            "Configuration error: missing"
        );
    }
}
