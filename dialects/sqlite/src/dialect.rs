//! SQLite dialect implementation

use std::path::Path;

use async_trait::async_trait;
use rusqlite::params_from_iter;
use tracing::{debug, warn};

use corm_core::dialect::{DatabaseInfo, Dialect, Paramstyle, Row, Statement};
use corm_core::error::{DatabaseError, Error};
use corm_core::metadata::ColumnType;

use crate::connection::{SqliteConfig, SqliteConnectionManager};
use crate::error::SqliteError;
use crate::value::{bind_value, column_value};

/// An embedded SQLite engine behind a bb8 pool.
#[derive(Debug)]
pub struct SqliteDialect {
    pool: bb8::Pool<SqliteConnectionManager>,
}

impl SqliteDialect {
    /// Wrap an existing pool.
    pub fn new(pool: bb8::Pool<SqliteConnectionManager>) -> Self {
        Self { pool }
    }

    pub async fn connect(config: SqliteConfig) -> Result<Self, Error> {
        config.validate()?;
        // An in-memory database vanishes with its last connection, so it is
        // pinned to a single pooled connection.
        let max_size = if config.filename.is_none() { 1 } else { config.pool_size };
        let manager = SqliteConnectionManager::new(config);
        let pool = bb8::Pool::builder()
            .max_size(max_size)
            .build(manager)
            .await
            .map_err(|e| DatabaseError::Pool(e.to_string()))?;
        Ok(Self::new(pool))
    }

    /// Open a file-based SQLite database.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::connect(SqliteConfig::file(path.as_ref())).await
    }

    /// Open an in-memory SQLite database (for testing).
    pub async fn open_in_memory() -> Result<Self, Error> {
        Self::connect(SqliteConfig::memory()).await
    }

    /// Get a reference to the connection pool (for testing/diagnostics)
    pub fn pool(&self) -> &bb8::Pool<SqliteConnectionManager> {
        &self.pool
    }

    async fn checkout(
        &self,
    ) -> Result<bb8::PooledConnection<'_, SqliteConnectionManager>, DatabaseError> {
        self.pool.get().await.map_err(|e| DatabaseError::Pool(e.to_string()))
    }

    async fn version(&self) -> Result<String, DatabaseError> {
        let conn = self.checkout().await?;
        let version = conn
            .with_connection(|c| {
                c.query_row("SELECT sqlite_version()", [], |row| row.get::<_, String>(0))
                    .map_err(SqliteError::from)
            })
            .await?;
        Ok(version)
    }
}

#[async_trait]
impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    /// Conservative portability bound; SQLite itself does not limit
    /// identifier length.
    fn max_identifier_length(&self) -> usize {
        30
    }

    fn paramstyle(&self) -> Paramstyle {
        Paramstyle::Positional
    }

    fn supports_returning(&self) -> bool {
        false
    }

    fn column_type_sql(&self, column_type: ColumnType) -> &'static str {
        match column_type {
            ColumnType::String => "varchar(255)",
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::BigInteger => "integer",
            ColumnType::Float => "real",
            ColumnType::Decimal => "numeric",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::DateTime => "datetime",
            ColumnType::Json => "text",
        }
    }

    fn primary_key_sql(&self) -> &'static str {
        "integer primary key autoincrement"
    }

    async fn database_info(&self) -> DatabaseInfo {
        let version = match self.version().await {
            Ok(version) => version,
            Err(err) => {
                warn!("Could not read sqlite version: {}", err);
                "unknown".to_string()
            }
        };
        DatabaseInfo { engine: "sqlite", version }
    }

    async fn query(&self, statement: &Statement) -> Result<Vec<Row>, DatabaseError> {
        debug!("sqlite query: {} with {} params", statement.sql, statement.bindings.len());
        let conn = self.checkout().await?;
        let sql = statement.sql.clone();
        let bindings: Vec<rusqlite::types::Value> =
            statement.bindings.iter().map(bind_value).collect();

        let rows = conn
            .with_connection(move |c| {
                let mut stmt = c.prepare(&sql)?;
                let columns: Vec<String> =
                    stmt.column_names().iter().map(|name| name.to_string()).collect();
                let mut raw = stmt.query(params_from_iter(bindings.iter()))?;
                let mut rows = Vec::new();
                while let Some(row) = raw.next()? {
                    let mut decoded = Row::new();
                    for (index, name) in columns.iter().enumerate() {
                        let value: rusqlite::types::Value = row.get(index)?;
                        decoded.insert(name.clone(), column_value(value));
                    }
                    rows.push(decoded);
                }
                Ok(rows)
            })
            .await?;
        Ok(rows)
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, DatabaseError> {
        debug!("sqlite execute: {} with {} params", statement.sql, statement.bindings.len());
        let conn = self.checkout().await?;
        let sql = statement.sql.clone();
        let bindings: Vec<rusqlite::types::Value> =
            statement.bindings.iter().map(bind_value).collect();

        let affected = conn
            .with_connection(move |c| {
                let affected = c.execute(&sql, params_from_iter(bindings.iter()))?;
                Ok(affected as u64)
            })
            .await?;
        Ok(affected)
    }

    async fn insert(&self, statement: &Statement) -> Result<i64, DatabaseError> {
        debug!("sqlite insert: {} with {} params", statement.sql, statement.bindings.len());
        let conn = self.checkout().await?;
        let sql = statement.sql.clone();
        let bindings: Vec<rusqlite::types::Value> =
            statement.bindings.iter().map(bind_value).collect();

        // last_insert_rowid is per-connection state, so it has to be read in
        // the same closure as the INSERT.
        let id = conn
            .with_connection(move |c| {
                c.execute(&sql, params_from_iter(bindings.iter()))?;
                Ok(c.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }
}
