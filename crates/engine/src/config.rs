//! Engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ORDERLINE_DATABASE_URL` - `PostgreSQL` connection string
//!
//! ## Optional
//! - `ORDERLINE_DB_MAX_CONNECTIONS` - Pool size cap (default: 10)
//! - `ORDERLINE_DB_MIN_CONNECTIONS` - Idle pool floor (default: 2)
//! - `ORDERLINE_DB_ACQUIRE_TIMEOUT_SECS` - Pool acquire timeout (default: 10)

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 2;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Configuration for the order engine's database access.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// `PostgreSQL` connection string.
    pub database_url: SecretString,
    /// Maximum pool connections.
    pub max_connections: u32,
    /// Minimum idle pool connections.
    pub min_connections: u32,
    /// Seconds to wait when acquiring a pooled connection.
    pub acquire_timeout_secs: u64,
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// An environment variable holds a value that cannot be parsed.
    #[error("invalid value for {name}: {message}")]
    InvalidValue {
        /// Variable name.
        name: &'static str,
        /// What was wrong with it.
        message: String,
    },
}

impl EngineConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `ORDERLINE_DATABASE_URL`
    /// is unset, or [`ConfigError::InvalidValue`] when a numeric override
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("ORDERLINE_DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnvVar("ORDERLINE_DATABASE_URL"))?
            .into();

        Ok(Self {
            database_url,
            max_connections: parse_env("ORDERLINE_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            min_connections: parse_env("ORDERLINE_DB_MIN_CONNECTIONS", DEFAULT_MIN_CONNECTIONS)?,
            acquire_timeout_secs: parse_env(
                "ORDERLINE_DB_ACQUIRE_TIMEOUT_SECS",
                DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?,
        })
    }
}

/// Parse an optional numeric environment variable with a default.
fn parse_env<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            name,
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
