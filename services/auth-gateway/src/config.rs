//! Gateway configuration with validation.
//!
//! Values come from environment variables, with `.env` support via `dotenvy`.

use std::env;
use std::time::Duration;

use resilient_rpc::{ConnectOptions, Endpoint, RetryConfig};
use thiserror::Error;

use crate::auth::AUTH_SERVICE_NAME;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid port number
    #[error("Invalid port: must be between 1 and 65535")]
    InvalidPort,

    /// Invalid duration value
    #[error("Invalid duration for {name}: must be greater than 0")]
    InvalidDuration {
        /// Offending variable
        name: String,
    },

    /// Missing required field
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Offending variable
        name: String,
        /// Parser message
        reason: String,
    },
}

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Authentication service host
    pub auth_host: String,
    /// Authentication service port (1-65535)
    pub auth_port: u16,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay between attempts in milliseconds (must be > 0)
    pub retry_interval_ms: u64,
    /// Per-attempt deadline in milliseconds (must be > 0)
    pub call_timeout_ms: u64,
    /// Transport connect timeout in milliseconds (must be > 0)
    pub connect_timeout_ms: u64,
    /// Connect at startup instead of on first use
    pub connect_eagerly: bool,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
    /// Log level filter
    pub log_level: String,
    /// Emit JSON logs
    pub log_json: bool,
}

impl Config {
    /// Loads configuration from environment variables with validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable cannot be parsed or a value is
    /// out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Self {
            auth_host: env::var("AUTH_HOST").unwrap_or_else(|_| "auth".to_string()),
            auth_port: parse_env("AUTH_PORT", 50051)?,
            max_retries: parse_env("AUTH_MAX_RETRIES", 3)?,
            retry_interval_ms: parse_env("AUTH_RETRY_INTERVAL_MS", 1000)?,
            call_timeout_ms: parse_env("AUTH_CALL_TIMEOUT_MS", 5000)?,
            connect_timeout_ms: parse_env("AUTH_CONNECT_TIMEOUT_MS", 5000)?,
            connect_eagerly: parse_env("AUTH_CONNECT_EAGERLY", false)?,
            shutdown_timeout_seconds: parse_env("SHUTDOWN_TIMEOUT", 30)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_json: parse_env("LOG_JSON", false)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth_port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.auth_host.trim().is_empty() {
            return Err(ConfigError::MissingRequired("AUTH_HOST".to_string()));
        }
        if self.retry_interval_ms == 0 {
            return Err(ConfigError::InvalidDuration {
                name: "AUTH_RETRY_INTERVAL_MS".to_string(),
            });
        }
        if self.call_timeout_ms == 0 {
            return Err(ConfigError::InvalidDuration {
                name: "AUTH_CALL_TIMEOUT_MS".to_string(),
            });
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidDuration {
                name: "AUTH_CONNECT_TIMEOUT_MS".to_string(),
            });
        }
        Ok(())
    }

    /// Address of the authentication service.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequired`] if the host is unusable.
    pub fn endpoint(&self) -> Result<Endpoint, ConfigError> {
        Endpoint::new(self.auth_host.clone(), self.auth_port)
            .map_err(|_| ConfigError::MissingRequired("AUTH_HOST".to_string()))
    }

    /// Retry settings for every operation.
    #[must_use]
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::default()
            .with_max_retries(self.max_retries)
            .with_retry_interval(Duration::from_millis(self.retry_interval_ms))
    }

    /// Channel options for the authentication service.
    #[must_use]
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions::new(AUTH_SERVICE_NAME)
            .with_connect_eagerly(self.connect_eagerly)
            .with_connect_timeout(Duration::from_millis(self.connect_timeout_ms))
    }

    /// Per-attempt deadline.
    #[must_use]
    pub const fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Graceful shutdown bound.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auth_host: "auth".to_string(),
            auth_port: 50051,
            max_retries: 3,
            retry_interval_ms: 1000,
            call_timeout_ms: 5000,
            connect_timeout_ms: 5000,
            connect_eagerly: false,
            shutdown_timeout_seconds: 30,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

/// Parse an environment variable with a default value.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.parse().map_err(|e: T::Err| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
