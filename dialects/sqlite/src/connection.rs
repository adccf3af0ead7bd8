//! bb8 connection manager for rusqlite.

use std::path::PathBuf;
use std::sync::Arc;

use rusqlite::Connection;
use serde::Deserialize;
use tokio::sync::Mutex;

use corm_core::error::ConfigurationError;

use crate::error::SqliteError;

/// Default connection pool size for file-backed databases.
pub const DEFAULT_POOL_SIZE: u32 = 10;

fn default_pool_size() -> u32 {
    DEFAULT_POOL_SIZE
}

/// Connection settings. No `filename` means an in-memory database, which is
/// always driven through a single-connection pool so the database outlives
/// any one call.
#[derive(Clone, Debug, Deserialize)]
pub struct SqliteConfig {
    #[serde(default)]
    pub filename: Option<PathBuf>,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        SqliteConfig { filename: None, pool_size: DEFAULT_POOL_SIZE }
    }
}

impl SqliteConfig {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        SqliteConfig { filename: Some(path.into()), ..Default::default() }
    }

    pub fn memory() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.pool_size == 0 {
            return Err(ConfigurationError::MissingSetting { field: "pool_size" });
        }
        Ok(())
    }
}

/// Hands out [`PooledConnection`]s to bb8. A rusqlite connection is not
/// `Send`, so each one lives behind an `Arc<Mutex>` and is only ever touched
/// from `spawn_blocking`.
pub struct SqliteConnectionManager {
    config: SqliteConfig,
}

impl SqliteConnectionManager {
    pub fn new(config: SqliteConfig) -> Self {
        Self { config }
    }

    fn create_connection(&self) -> Result<Connection, SqliteError> {
        let conn = match &self.config.filename {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };

        // foreign_keys is off by default in SQLite and the generated schema
        // relies on its ON DELETE actions.
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;
             PRAGMA cache_size=-64000;
             PRAGMA mmap_size=268435456;
             PRAGMA temp_store=MEMORY;",
        )?;

        Ok(conn)
    }
}

/// One pooled connection. Cloning shares the same underlying connection.
pub struct PooledConnection {
    inner: Arc<Mutex<Connection>>,
}

impl PooledConnection {
    pub fn new(conn: Connection) -> Self {
        Self { inner: Arc::new(Mutex::new(conn)) }
    }

    /// Runs `f` against the connection inside `spawn_blocking`, holding the
    /// lock for the duration of the call.
    pub async fn with_connection<F, T>(&self, f: F) -> Result<T, SqliteError>
    where
        F: FnOnce(&Connection) -> Result<T, SqliteError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.blocking_lock();
            f(&guard)
        })
        .await
        .map_err(|e| SqliteError::TaskJoin(e.to_string()))?
    }
}

impl Clone for PooledConnection {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl bb8::ManageConnection for SqliteConnectionManager {
    type Connection = PooledConnection;
    type Error = SqliteError;

    fn connect(&self) -> impl std::future::Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let config = self.config.clone();
        async move {
            let manager = SqliteConnectionManager::new(config);
            tokio::task::spawn_blocking(move || manager.create_connection().map(PooledConnection::new))
                .await
                .map_err(|e| SqliteError::TaskJoin(e.to_string()))?
        }
    }

    #[allow(refining_impl_trait)]
    fn is_valid<'a, 'b>(
        &'a self,
        conn: &'b mut Self::Connection,
    ) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send {
        let inner = conn.inner.clone();
        async move {
            tokio::task::spawn_blocking(move || {
                let guard = inner.blocking_lock();
                guard.execute_batch("SELECT 1").map_err(SqliteError::from)
            })
            .await
            .map_err(|e| SqliteError::TaskJoin(e.to_string()))?
        }
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}
