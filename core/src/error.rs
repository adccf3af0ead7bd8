//! Error types for corm.
//!
//! Three families, surfaced behind the umbrella [`Error`]:
//! configuration problems are fatal at startup, validation problems reject a
//! schema or query before any SQL is generated, and database problems wrap
//! whatever the engine reported. Failed version introspection is not an
//! error; it degrades to `"unknown"` with a warning log.

use std::time::Duration;
use thiserror::Error;

/// Startup configuration failures. None of these are recoverable at runtime;
/// the schema or the options have to change.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The incompressible parts of an identifier alone exceed the dialect
    /// budget, so no amount of shortening can help.
    #[error("identifier \"{joined}\" cannot fit in {max_length} chars ({required} required)")]
    IdentifierBudget { joined: String, max_length: usize, required: usize },

    #[error("invalid table prefix {prefix:?}: {reason}")]
    InvalidTablePrefix { prefix: String, reason: &'static str },

    #[error("missing setting: {field}")]
    MissingSetting { field: &'static str },
}

/// Schema or query shapes that are rejected before any SQL is generated.
/// Every variant carries enough detail to fix the input without reading
/// source code.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Two attributes of the same content type compressed to the same
    /// physical column name. Caught at compile time, never as a runtime
    /// SQL error.
    #[error("attributes \"{first}\" and \"{second}\" of {uid} both map to column \"{column}\"")]
    ColumnCollision { uid: String, first: String, second: String, column: String },

    #[error("{first} and {second} both map to table \"{table}\"")]
    DuplicateTableName { table: String, first: String, second: String },

    #[error("content type {uid} is declared twice")]
    DuplicateContentType { uid: String },

    #[error("unknown content type: {uid}")]
    UnknownContentType { uid: String },

    #[error("unknown field \"{field}\" on {uid}")]
    UnknownField { uid: String, field: String },

    #[error("\"{field}\" on {uid} is not a relation")]
    NotARelation { uid: String, field: String },

    #[error("relation \"{field}\" on {uid} has no target content type")]
    MissingTarget { uid: String, field: String },

    #[error("relation \"{field}\" on {uid} targets unknown content type {target}")]
    UnknownTarget { uid: String, field: String, target: String },

    #[error("\"{field}\" on {uid} references {target}, which is not a component")]
    TargetNotComponent { uid: String, field: String, target: String },

    #[error("relation \"{field}\" on {uid} requires `{setting}` naming its partner attribute")]
    MissingInverse { uid: String, field: String, setting: &'static str },

    #[error("relation \"{field}\" on {uid}: partner attribute \"{partner}\" {reason}")]
    InvalidInverse { uid: String, field: String, partner: String, reason: &'static str },

    #[error("cannot link through \"{field}\" on {uid}: {reason}")]
    LinkNotSupported { uid: String, field: String, reason: &'static str },

    #[error("operator {operator} is not supported on \"{field}\" ({column_type} column)")]
    OperatorNotSupported { field: String, operator: cormql::Operator, column_type: &'static str },

    #[error("malformed filter: {reason}")]
    MalformedFilter { reason: String },

    #[error("invalid payload: {reason}")]
    InvalidPayload { reason: String },

    #[error("populate of \"{field}\" cannot carry limit or offset")]
    PopulatePagination { field: String },
}

/// Failures reported by the database engine, classified where the error code
/// allows it. Messages never include SQL text or credentials.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("unique constraint violated: {message}")]
    UniqueConstraint { constraint: Option<String>, message: String },

    #[error("statement timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },

    #[error("connection pool error: {0}")]
    Pool(String),

    #[error("driver error: {message}")]
    Driver { message: String },

    /// Context wrapper attached by the repository so callers see which
    /// operation on which content type failed.
    #[error("{operation} on {uid} failed: {source}")]
    Operation { operation: &'static str, uid: String, source: Box<DatabaseError> },
}

impl DatabaseError {
    pub fn driver(message: impl std::fmt::Display) -> Self { DatabaseError::Driver { message: message.to_string() } }

    /// Unwraps [`DatabaseError::Operation`] layers down to the underlying
    /// failure. Handy for matching on the classified kind in callers.
    pub fn root(&self) -> &DatabaseError {
        match self {
            DatabaseError::Operation { source, .. } => source.root(),
            other => other,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// A lifecycle hook returned a failure of its own making.
    #[error("hook \"{name}\" failed: {message}")]
    Hook { name: String, message: String },
}

impl Error {
    pub fn hook(name: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Error::Hook { name: name.into(), message: message.to_string() }
    }
}
