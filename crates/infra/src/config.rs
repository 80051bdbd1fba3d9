//! Environment-driven application configuration

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use lexbook_domain::{LexbookError, Result};
use serde::Deserialize;

/// Application configuration, loaded from the environment (optionally via a
/// `.env` file the binary loads with `dotenvy` before calling
/// [`Config::from_env`]).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub sweeper: SweeperConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub pool_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SweeperConfig {
    /// Cron expression driving the expiration sweep.
    pub cron_expression: String,
}

impl Config {
    /// Read configuration from the process environment, falling back to
    /// development defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let path = env::var("LEXBOOK_DB_PATH").unwrap_or_else(|_| "lexbook.db".into()).into();

        let pool_size = match env::var("LEXBOOK_DB_POOL_SIZE") {
            Ok(raw) => raw.parse::<u32>().map_err(|_| {
                LexbookError::Validation(format!("LEXBOOK_DB_POOL_SIZE {raw:?} is not a number"))
            })?,
            Err(_) => 4,
        };

        let bind_addr = match env::var("LEXBOOK_BIND_ADDR") {
            Ok(raw) => raw.parse::<SocketAddr>().map_err(|_| {
                LexbookError::Validation(format!(
                    "LEXBOOK_BIND_ADDR {raw:?} is not a socket address"
                ))
            })?,
            Err(_) => SocketAddr::from(([127, 0, 0, 1], 8080)),
        };

        // hourly, at the top of the hour
        let cron_expression =
            env::var("LEXBOOK_SWEEP_CRON").unwrap_or_else(|_| "0 0 * * * *".into());

        Ok(Self {
            database: DatabaseConfig { path, pool_size },
            server: ServerConfig { bind_addr },
            sweeper: SweeperConfig { cron_expression },
        })
    }
}
