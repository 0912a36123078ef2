//! Startup configuration read from the environment (and an optional `.env`).

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::db::StoreLocation;

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const DB_NAME: &str = "DB_NAME";
pub const BIND_ADDR: &str = "BIND_ADDR";
pub const LOG_FILTER: &str = "RUST_LOG";

const DEFAULT_DB_NAME: &str = "notes";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_LOG_FILTER: &str = "info";
const MEMORY_URL: &str = "sqlite::memory:";
const SQLITE_SCHEME: &str = "sqlite://";
const DB_FILE_EXTENSION: &str = "sqlite3";

/// Configuration problems that keep the server from starting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is not set; add it to the environment or .env")]
    Missing(&'static str),

    #[error("{name} has invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub store: StoreLocation,
    pub bind: SocketAddr,
    pub log_filter: String,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`, which returns a variable's value.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let url = get(DATABASE_URL).ok_or(ConfigError::Missing(DATABASE_URL))?;
        let db_name = get(DB_NAME).unwrap_or_else(|| DEFAULT_DB_NAME.to_string());
        let store = store_location(url.trim(), db_name.trim())?;

        let bind_text = get(BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind = parse_bind_addr(&bind_text)?;

        let log_filter = get(LOG_FILTER).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            store,
            bind,
            log_filter,
        })
    }

    /// Short description of the store for logs.
    pub fn store_summary(&self) -> String {
        match &self.store {
            StoreLocation::Memory => "memory".to_string(),
            StoreLocation::File(path) => path.display().to_string(),
        }
    }
}

/// Parses a `host:port` listen address.
pub fn parse_bind_addr(value: &str) -> Result<SocketAddr, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|err: std::net::AddrParseError| ConfigError::Invalid {
            name: BIND_ADDR,
            value: value.to_string(),
            reason: err.to_string(),
        })
}

fn store_location(url: &str, db_name: &str) -> Result<StoreLocation, ConfigError> {
    if url == MEMORY_URL {
        return Ok(StoreLocation::Memory);
    }

    if db_name.contains(['/', '\\']) || db_name == "." || db_name == ".." {
        return Err(ConfigError::Invalid {
            name: DB_NAME,
            value: db_name.to_string(),
            reason: "must be a plain file name".to_string(),
        });
    }

    let directory = url.strip_prefix(SQLITE_SCHEME).unwrap_or(url);
    if directory.is_empty() {
        return Err(ConfigError::Invalid {
            name: DATABASE_URL,
            value: url.to_string(),
            reason: "expected sqlite::memory:, sqlite://<dir> or a directory path".to_string(),
        });
    }

    Ok(StoreLocation::File(database_file(Path::new(directory), db_name)))
}

fn database_file(directory: &Path, db_name: &str) -> PathBuf {
    directory.join(format!("{db_name}.{DB_FILE_EXTENSION}"))
}
