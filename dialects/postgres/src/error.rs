//! Error types for the Postgres dialect

use thiserror::Error;
use tokio_postgres::error::SqlState;

use corm_core::error::DatabaseError;

#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("Postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Unsupported column type: {0}")]
    UnsupportedType(String),
}

impl From<PostgresError> for DatabaseError {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::Postgres(e) => classify(e),
            PostgresError::Pool(message) => DatabaseError::Pool(message),
            PostgresError::UnsupportedType(ty) => {
                DatabaseError::Driver { message: format!("unsupported column type: {}", ty) }
            }
        }
    }
}

/// Maps a driver failure onto the shared taxonomy. Unique violations carry
/// the server-reported constraint name; everything else stays a driver
/// error.
fn classify(err: tokio_postgres::Error) -> DatabaseError {
    if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        let constraint =
            err.as_db_error().and_then(|db| db.constraint()).map(|name| name.to_string());
        let message = err
            .as_db_error()
            .map(|db| db.message().to_string())
            .unwrap_or_else(|| err.to_string());
        return DatabaseError::UniqueConstraint { constraint, message };
    }
    DatabaseError::Driver { message: err.to_string() }
}
