use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use crate::config::{ConfigSource, ConnectionOptions};
use crate::connection::DbConnection;
use crate::error::DataAccessError;
use crate::prepared::PreparedExecution;
use crate::types::ParameterBinding;

/// Owner of the one database connection an application uses.
///
/// Build one at startup and share it by reference (or `Arc`). The connection is opened
/// on the first [`ConnectionManager::acquire`]; concurrent first callers are serialized
/// so exactly one connection is opened, and every later call returns that same handle
/// without locking. A failed first attempt leaves the manager unconnected, so a later
/// call can succeed once the configuration is fixed.
///
/// ```rust,no_run
/// use sql_data_access::prelude::*;
///
/// # fn main() -> Result<(), DataAccessError> {
/// let manager = ConnectionManager::new(ConfigSource::from_env());
/// manager.acquire()?;
/// if let Some(stmt) = manager.prepare(
///     "INSERT INTO M_PERSON (PERSON_NAME, AGE) VALUES (?, ?)",
///     vec![
///         ParameterBinding::new("Alice", SqlType::VarChar),
///         ParameterBinding::new(24, SqlType::SmallInt),
///     ],
/// )? {
///     stmt.insert()?;
/// }
/// manager.commit()?;
/// # Ok(())
/// # }
/// ```
pub struct ConnectionManager {
    source: ConfigSource,
    connection: OnceLock<Arc<DbConnection>>,
    init_lock: Mutex<()>,
    connections_opened: AtomicUsize,
}

impl ConnectionManager {
    #[must_use]
    pub fn new(source: impl Into<ConfigSource>) -> Self {
        Self {
            source: source.into(),
            connection: OnceLock::new(),
            init_lock: Mutex::new(()),
            connections_opened: AtomicUsize::new(0),
        }
    }

    /// Manager reading its settings from the file named by `DATA_ACCESS_PROPERTIES`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(ConfigSource::from_env())
    }

    /// The shared connection, opening it on first use.
    ///
    /// # Errors
    /// `ConfigError` if the property source is missing or malformed, `DriverError` if no
    /// driver handles the URL, `ConnectionError` if the database cannot be opened.
    pub fn acquire(&self) -> Result<Arc<DbConnection>, DataAccessError> {
        if let Some(conn) = self.connection.get() {
            return Ok(Arc::clone(conn));
        }
        let _guard = self.init_lock.lock().map_err(|_| {
            DataAccessError::ConnectionError("connection initialization lock poisoned".to_string())
        })?;
        if let Some(conn) = self.connection.get() {
            return Ok(Arc::clone(conn));
        }

        let props = self.source.resolve()?;
        let opts = ConnectionOptions::from_properties(&props);
        let conn = Arc::new(DbConnection::open(&opts)?);
        self.connections_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(self.connection.get_or_init(|| conn)))
    }

    /// The shared connection if it has been established.
    #[must_use]
    pub fn connection(&self) -> Option<&Arc<DbConnection>> {
        self.connection.get()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.get().is_some()
    }

    /// How many physical connections this manager has opened: 0 or 1.
    #[must_use]
    pub fn connections_opened(&self) -> usize {
        self.connections_opened.load(Ordering::SeqCst)
    }

    /// Commit the current unit of work. `false` when not connected.
    ///
    /// # Errors
    /// Returns the driver error if the commit fails.
    pub fn commit(&self) -> Result<bool, DataAccessError> {
        let Some(conn) = self.connection.get() else {
            return Ok(false);
        };
        conn.commit()?;
        Ok(true)
    }

    /// Roll back the current unit of work. `false` when not connected.
    ///
    /// # Errors
    /// Returns the driver error if the rollback fails.
    pub fn rollback(&self) -> Result<bool, DataAccessError> {
        let Some(conn) = self.connection.get() else {
            return Ok(false);
        };
        conn.rollback()?;
        Ok(true)
    }

    /// Prepare `sql` on the shared connection with `params` bound in placeholder order.
    ///
    /// Returns `Ok(None)` when not connected; this never opens the connection.
    ///
    /// # Errors
    /// Returns a statement error if preparing or binding fails.
    pub fn prepare(
        &self,
        sql: &str,
        params: impl IntoIterator<Item = ParameterBinding>,
    ) -> Result<Option<PreparedExecution>, DataAccessError> {
        let Some(conn) = self.connection.get() else {
            return Ok(None);
        };
        PreparedExecution::new(Arc::clone(conn), sql, params).map(Some)
    }

    /// [`ConnectionManager::prepare`] without parameters.
    ///
    /// # Errors
    /// Returns a statement error if preparing fails.
    pub fn prepare_sql(&self, sql: &str) -> Result<Option<PreparedExecution>, DataAccessError> {
        self.prepare(sql, std::iter::empty())
    }

    /// Human-readable connection details, or `""` when not connected.
    ///
    /// # Errors
    /// Returns the driver error if server metadata cannot be read.
    pub fn describe(&self) -> Result<String, DataAccessError> {
        match self.connection.get() {
            Some(conn) => conn.describe(),
            None => Ok(String::new()),
        }
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("source", &self.source)
            .field("connection", &self.connection.get())
            .field("connections_opened", &self.connections_opened())
            .finish()
    }
}
