//! Connection settings for the bb8-postgres pool.

use serde::Deserialize;

use corm_core::error::ConfigurationError;

/// Default connection pool size.
pub const DEFAULT_POOL_SIZE: u32 = 10;

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_pool_size() -> u32 {
    DEFAULT_POOL_SIZE
}

/// Server connection settings. `dbname`, `user` and `password` have no
/// sensible defaults and are validated before any connection attempt.
#[derive(Clone, Debug, Deserialize)]
pub struct PostgresConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub dbname: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        PostgresConfig {
            host: default_host(),
            port: default_port(),
            dbname: String::new(),
            user: String::new(),
            password: String::new(),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl PostgresConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.dbname.is_empty() {
            return Err(ConfigurationError::MissingSetting { field: "dbname" });
        }
        if self.user.is_empty() {
            return Err(ConfigurationError::MissingSetting { field: "user" });
        }
        if self.pool_size == 0 {
            return Err(ConfigurationError::MissingSetting { field: "pool_size" });
        }
        Ok(())
    }

    /// The driver-level config this resolves to. The password may be empty
    /// for trust-authenticated local servers.
    pub(crate) fn driver_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config.host(&self.host).port(self.port).dbname(&self.dbname).user(&self.user);
        if !self.password.is_empty() {
            config.password(&self.password);
        }
        config
    }
}
