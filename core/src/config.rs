//! Database-level options shared by every dialect.
//!
//! Engine-specific connection settings (file paths, hosts, pool sizes) live
//! in the dialect crates; this module only carries what the core layer needs
//! to compile metadata and run statements.

use serde::Deserialize;
use std::time::Duration;

use crate::error::ConfigurationError;

/// Longest allowed table prefix. Prefixes are incompressible, so a long one
/// would eat the identifier budget of every table in the registry.
pub const MAX_TABLE_PREFIX_LENGTH: usize = 10;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseOptions {
    /// Optional prefix prepended to every physical table name.
    #[serde(default)]
    pub table_prefix: Option<String>,

    /// Upper bound for a single statement. `None` lets the engine take as
    /// long as it takes.
    #[serde(default)]
    pub statement_timeout: Option<Duration>,
}

impl DatabaseOptions {
    pub fn new() -> Self { Self::default() }

    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = Some(prefix.into());
        self
    }

    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = Some(timeout);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if let Some(prefix) = &self.table_prefix {
            let invalid = |reason| ConfigurationError::InvalidTablePrefix { prefix: prefix.clone(), reason };

            if prefix.is_empty() {
                return Err(invalid("must not be empty"));
            }
            if prefix.len() > MAX_TABLE_PREFIX_LENGTH {
                return Err(invalid("must be at most 10 characters"));
            }
            if prefix.starts_with(|c: char| c.is_ascii_digit()) {
                return Err(invalid("must not start with a digit"));
            }
            if !prefix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
                return Err(invalid("only lowercase letters, digits and underscores allowed"));
            }
        }
        Ok(())
    }
}
