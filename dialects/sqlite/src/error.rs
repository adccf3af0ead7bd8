//! Error types for the SQLite dialect

use thiserror::Error;

use corm_core::error::DatabaseError;

/// Extended result code for a violated UNIQUE index.
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;
/// Extended result code for a violated PRIMARY KEY.
const SQLITE_CONSTRAINT_PRIMARYKEY: i32 = 1555;

#[derive(Debug, Error)]
pub enum SqliteError {
    #[error("SQLite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Task join error: {0}")]
    TaskJoin(String),
}

impl From<SqliteError> for DatabaseError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::Rusqlite(e) => classify(e),
            SqliteError::Pool(message) => DatabaseError::Pool(message),
            SqliteError::TaskJoin(message) => DatabaseError::Driver { message },
        }
    }
}

/// Maps a rusqlite failure onto the shared taxonomy. Unique and primary key
/// violations are picked out by extended result code so callers can react to
/// them; everything else stays a driver error.
fn classify(err: rusqlite::Error) -> DatabaseError {
    match &err {
        rusqlite::Error::SqliteFailure(code, message)
            if code.extended_code == SQLITE_CONSTRAINT_UNIQUE
                || code.extended_code == SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            DatabaseError::UniqueConstraint {
                constraint: message.as_deref().and_then(constraint_from_message),
                message: message.clone().unwrap_or_else(|| "unique constraint violated".to_string()),
            }
        }
        _ => DatabaseError::Driver { message: err.to_string() },
    }
}

/// SQLite reports violations as "UNIQUE constraint failed: table.column";
/// the part after the colon is the closest thing to a constraint name.
fn constraint_from_message(message: &str) -> Option<String> {
    message.rsplit_once(": ").map(|(_, name)| name.to_string())
}
