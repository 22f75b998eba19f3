//! Auth Gateway
//!
//! Host process that owns the retrying client for the authentication
//! service and exposes it to request handlers through a shared registry.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod shutdown;

pub use app::{AppState, run, run_with_connection};
pub use auth::{AUTH_REGISTRY_KEY, AUTH_SERVICE_NAME, AuthClient};
pub use config::{Config, ConfigError};
pub use error::GatewayError;
pub use logging::{LogFormat, LoggingConfig, init_logging};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal, wait_for_signal};
