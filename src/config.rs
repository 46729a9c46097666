//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default port, matching the service's historical `:9000`
pub const DEFAULT_PORT: u16 = 9000;

/// Default time allowed for in-flight requests during shutdown
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 1;

/// Configuration loading errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is set but cannot be parsed
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue {
        /// Variable name
        name: &'static str,
        /// Raw value found in the environment
        value: String,
    },
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
    /// Grace period for draining connections on shutdown
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: "0.0.0.0".to_string(),
            shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables with defaults
    ///
    /// Reads `HOST`, `PORT` and `SHUTDOWN_GRACE_SECS`. Unset variables fall
    /// back to the defaults; set but unparseable ones are an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();
        Ok(Self {
            server: ServerConfig {
                port: parse_var("PORT")?.unwrap_or(defaults.port),
                host: env::var("HOST").unwrap_or(defaults.host),
                shutdown_grace: parse_var("SHUTDOWN_GRACE_SECS")?
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.shutdown_grace),
            },
        })
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        Err(_) => Ok(None),
    }
}
