//! Log subscriber setup for the gateway process.
//!
//! `RUST_LOG` wins over the configured level. Transport crates are held at
//! `warn` so per-attempt retry events stay readable.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// Transport crates whose debug output drowns out retry events.
const QUIET_TARGETS: &[&str] = &["h2", "hyper", "hyper_util", "tower", "tonic::transport"];

/// Output format of log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event, with target, thread and source location
    Json,
}

/// Logging settings derived from [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Level for the gateway's own targets
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl From<&Config> for LoggingConfig {
    fn from(config: &Config) -> Self {
        Self {
            level: config.log_level.clone(),
            format: if config.log_json {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
        }
    }
}

impl LoggingConfig {
    /// Filter directives used when `RUST_LOG` is unset.
    #[must_use]
    pub fn directives(&self) -> String {
        let mut directives = vec![self.level.clone()];
        directives.extend(QUIET_TARGETS.iter().map(|target| format!("{target}=warn")));
        directives.join(",")
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.directives()))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Installs the global subscriber.
///
/// Returns `false` if one was already installed.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let subscriber = tracing_subscriber::registry().with(config.env_filter());

    let installed = match config.format {
        LogFormat::Json => subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()
            .is_ok(),
        LogFormat::Text => subscriber
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::info!(
            service = "auth-gateway",
            level = %config.level,
            format = ?config.format,
            "Logging initialized"
        );
    }
    installed
}
