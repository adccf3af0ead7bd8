#![cfg(feature = "postgres")]

use anyhow::Result;
use corm_postgres::{PostgresConfig, PostgresDialect};

fn env_or(name: &str, fallback: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| fallback.to_string())
}

/// Settings for the server this suite runs against, overridable through
/// `CORM_PG_*` so CI can point at its own instance.
#[allow(unused)]
pub fn config_from_env() -> PostgresConfig {
    PostgresConfig {
        host: env_or("CORM_PG_HOST", "localhost"),
        port: env_or("CORM_PG_PORT", "5432").parse().unwrap_or(5432),
        dbname: env_or("CORM_PG_DBNAME", "corm_test"),
        user: env_or("CORM_PG_USER", "postgres"),
        password: env_or("CORM_PG_PASSWORD", "postgres"),
        pool_size: 4,
    }
}

#[allow(unused)]
pub async fn connect_postgres() -> Result<PostgresDialect> {
    Ok(PostgresDialect::connect(config_from_env()).await?)
}
