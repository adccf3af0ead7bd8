//! The dialect seam between the query layer and a concrete engine.
//!
//! The core crate builds [`Statement`]s and hands them to a [`Dialect`]; the
//! dialect crates own connections, pooling, value conversion and error
//! classification. Everything the query builder needs to know about an
//! engine (identifier budget, placeholder style, RETURNING support, quoting)
//! is expressed here as capabilities instead of engine checks.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use cormql::Value;

use crate::error::DatabaseError;
use crate::metadata::ColumnType;

/// One decoded result row, keyed by column name.
pub type Row = BTreeMap<String, Value>;

/// SQL text plus its ordered bindings. Bindings are always parameterized;
/// no caller-supplied value is ever interpolated into the text.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub bindings: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, bindings: Vec<Value>) -> Self {
        Statement { sql: sql.into(), bindings }
    }
}

/// Placeholder style of the engine's wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paramstyle {
    /// `?`, bound by position.
    Positional,
    /// `$1`, `$2`, ... bound by number.
    Numbered,
}

/// Engine identification, for startup logging and diagnostics only.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseInfo {
    pub engine: &'static str,
    pub version: String,
}

#[async_trait]
pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// Hard upper bound for any identifier this engine accepts.
    fn max_identifier_length(&self) -> usize;

    fn paramstyle(&self) -> Paramstyle;

    /// Whether `INSERT ... RETURNING` is available. When it is not, the
    /// dialect's [`insert`](Dialect::insert) recovers the new row id through
    /// the driver on the same connection.
    fn supports_returning(&self) -> bool;

    fn quote_identifier(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn column_type_sql(&self, column_type: ColumnType) -> &'static str;

    /// Column definition for the surrogate `id` primary key.
    fn primary_key_sql(&self) -> &'static str;

    /// Engine name and version. Never fails: when introspection errors the
    /// dialect logs a warning and reports the version as `"unknown"`.
    async fn database_info(&self) -> DatabaseInfo;

    async fn query(&self, statement: &Statement) -> Result<Vec<Row>, DatabaseError>;

    /// Runs a statement and returns the number of affected rows.
    async fn execute(&self, statement: &Statement) -> Result<u64, DatabaseError>;

    /// Runs an INSERT and returns the new row id.
    async fn insert(&self, statement: &Statement) -> Result<i64, DatabaseError>;
}

/// A dialect together with the per-statement timeout policy. All execution in
/// the repository layer goes through this, so every driver call of a
/// multi-statement operation gets its own deadline.
pub(crate) struct Executor<'a> {
    dialect: &'a dyn Dialect,
    timeout: Option<Duration>,
}

impl<'a> Executor<'a> {
    pub fn new(dialect: &'a dyn Dialect, timeout: Option<Duration>) -> Self {
        Executor { dialect, timeout }
    }

    pub fn dialect(&self) -> &'a dyn Dialect {
        self.dialect
    }

    pub async fn query(&self, statement: &Statement) -> Result<Vec<Row>, DatabaseError> {
        self.bounded(self.dialect.query(statement)).await
    }

    pub async fn execute(&self, statement: &Statement) -> Result<u64, DatabaseError> {
        self.bounded(self.dialect.execute(statement)).await
    }

    pub async fn insert(&self, statement: &Statement) -> Result<i64, DatabaseError> {
        self.bounded(self.dialect.insert(statement)).await
    }

    /// The elapsed timeout abandons the in-flight call; dropping the future
    /// releases its pooled connection.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, DatabaseError>>,
    ) -> Result<T, DatabaseError> {
        match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(DatabaseError::Timeout { elapsed: limit }),
            },
            None => call.await,
        }
    }
}
