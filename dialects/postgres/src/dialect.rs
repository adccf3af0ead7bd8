//! Postgres dialect implementation

use async_trait::async_trait;
use bb8_postgres::{tokio_postgres::NoTls, PostgresConnectionManager};
use tokio_postgres::types::ToSql;
use tracing::{debug, warn};

use corm_core::dialect::{DatabaseInfo, Dialect, Paramstyle, Row, Statement};
use corm_core::error::{DatabaseError, Error};
use corm_core::metadata::ColumnType;

use crate::connection::PostgresConfig;
use crate::error::PostgresError;
use crate::value::{column_value, PgParam};

/// A client/server Postgres engine behind a bb8 pool.
pub struct PostgresDialect {
    pool: bb8::Pool<PostgresConnectionManager<NoTls>>,
}

impl PostgresDialect {
    /// Wrap an existing pool.
    pub fn new(pool: bb8::Pool<PostgresConnectionManager<NoTls>>) -> Self {
        Self { pool }
    }

    pub async fn connect(config: PostgresConfig) -> Result<Self, Error> {
        config.validate()?;
        let manager = PostgresConnectionManager::new(config.driver_config(), NoTls);
        let pool = bb8::Pool::builder()
            .max_size(config.pool_size)
            .build(manager)
            .await
            .map_err(|e| DatabaseError::Pool(e.to_string()))?;
        Ok(Self::new(pool))
    }

    /// Get a reference to the connection pool (for testing/diagnostics)
    pub fn pool(&self) -> &bb8::Pool<PostgresConnectionManager<NoTls>> {
        &self.pool
    }

    async fn checkout(
        &self,
    ) -> Result<bb8::PooledConnection<'_, PostgresConnectionManager<NoTls>>, DatabaseError> {
        self.pool.get().await.map_err(|e| DatabaseError::Pool(e.to_string()))
    }

    async fn version(&self) -> Result<String, DatabaseError> {
        let client = self.checkout().await?;
        let row = client
            .query_one("SELECT current_setting('server_version')", &[])
            .await
            .map_err(PostgresError::from)?;
        let version: String = row.try_get(0).map_err(PostgresError::from)?;
        Ok(version)
    }

    fn params(statement: &Statement) -> Vec<PgParam> {
        statement.bindings.iter().cloned().map(PgParam).collect()
    }
}

#[async_trait]
impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn max_identifier_length(&self) -> usize {
        63
    }

    fn paramstyle(&self) -> Paramstyle {
        Paramstyle::Numbered
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn column_type_sql(&self, column_type: ColumnType) -> &'static str {
        match column_type {
            ColumnType::String => "varchar(255)",
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::BigInteger => "bigint",
            ColumnType::Float => "double precision",
            // numeric has no binary codec in tokio-postgres; stored as float8
            ColumnType::Decimal => "double precision",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::DateTime => "timestamptz",
            ColumnType::Json => "jsonb",
        }
    }

    fn primary_key_sql(&self) -> &'static str {
        "bigserial primary key"
    }

    async fn database_info(&self) -> DatabaseInfo {
        let version = match self.version().await {
            Ok(version) => version,
            Err(err) => {
                warn!("Could not read postgres version: {}", err);
                "unknown".to_string()
            }
        };
        DatabaseInfo { engine: "postgres", version }
    }

    async fn query(&self, statement: &Statement) -> Result<Vec<Row>, DatabaseError> {
        debug!("postgres query: {} with {} params", statement.sql, statement.bindings.len());
        let client = self.checkout().await?;
        let params = Self::params(statement);
        let refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        let raw = client.query(statement.sql.as_str(), &refs).await.map_err(PostgresError::from)?;
        let mut rows = Vec::with_capacity(raw.len());
        for row in &raw {
            let mut decoded = Row::new();
            for (index, column) in row.columns().iter().enumerate() {
                decoded.insert(column.name().to_string(), column_value(row, index)?);
            }
            rows.push(decoded);
        }
        Ok(rows)
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, DatabaseError> {
        debug!("postgres execute: {} with {} params", statement.sql, statement.bindings.len());
        let client = self.checkout().await?;
        let params = Self::params(statement);
        let refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        let affected =
            client.execute(statement.sql.as_str(), &refs).await.map_err(PostgresError::from)?;
        Ok(affected)
    }

    async fn insert(&self, statement: &Statement) -> Result<i64, DatabaseError> {
        debug!("postgres insert: {} with {} params", statement.sql, statement.bindings.len());
        let client = self.checkout().await?;
        let params = Self::params(statement);
        let refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        // The statement carries RETURNING "id", so the new id comes back as
        // the single result row.
        let row =
            client.query_one(statement.sql.as_str(), &refs).await.map_err(PostgresError::from)?;
        let id: i64 = row.try_get(0).map_err(PostgresError::from)?;
        Ok(id)
    }
}
