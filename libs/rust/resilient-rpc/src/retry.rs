//! Retry policy implementation.
//!
//! Retries transient failures up to a bound with a fixed delay between
//! attempts. Exponential backoff is available as an opt-in.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::classify::Classify;
use crate::error::ClientError;

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Every wait equals the retry interval
    Fixed,
    /// Wait grows by `multiplier` per attempt, capped at `max_delay`
    Exponential {
        /// Multiplier applied per attempt
        multiplier: f64,
        /// Upper bound for a single wait
        max_delay: Duration,
    },
}

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Delay between attempts
    pub retry_interval: Duration,
    /// Delay schedule
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_interval: Duration::from_secs(1),
            backoff: Backoff::Fixed,
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with custom max retries.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Create a new retry config with a custom retry interval.
    #[must_use]
    pub const fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Create a new retry config with exponential backoff.
    #[must_use]
    pub const fn with_exponential_backoff(mut self, multiplier: f64, max_delay: Duration) -> Self {
        self.backoff = Backoff::Exponential {
            multiplier,
            max_delay,
        };
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidConfig` if the retry interval is zero,
    /// the exponential multiplier is below 1, or the backoff cap is shorter
    /// than the retry interval.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.retry_interval.is_zero() {
            return Err(ClientError::invalid_config(
                "retry interval must be greater than zero",
            ));
        }
        if let Backoff::Exponential {
            multiplier,
            max_delay,
        } = self.backoff
        {
            if !multiplier.is_finite() || multiplier < 1.0 {
                return Err(ClientError::invalid_config(
                    "backoff multiplier must be a finite value >= 1",
                ));
            }
            // Every wait must be at least the retry interval.
            if max_delay < self.retry_interval {
                return Err(ClientError::invalid_config(
                    "backoff max delay must not be shorter than the retry interval",
                ));
            }
        }
        Ok(())
    }
}

/// Retry policy for executing operations with automatic retries.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a new retry policy with the given configuration.
    #[must_use]
    pub const fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Create a retry policy with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(RetryConfig::default())
    }

    /// Calculate the delay after the given zero-based attempt.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self.config.backoff {
            Backoff::Fixed => self.config.retry_interval,
            Backoff::Exponential {
                multiplier,
                max_delay,
            } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let scaled = self.config.retry_interval.as_secs_f64() * multiplier.powi(exponent);
                if scaled.is_finite() && scaled < max_delay.as_secs_f64() {
                    Duration::from_secs_f64(scaled)
                } else {
                    max_delay
                }
            }
        }
    }

    /// Check if an error should be retried after the given attempt.
    #[must_use]
    pub fn should_retry<E: Classify>(&self, error: &E, attempt: u32) -> bool {
        attempt < self.config.max_retries && error.is_transient()
    }

    /// Execute an async operation with retries.
    ///
    /// The operation runs at most `max_retries + 1` times. Attempts are
    /// strictly sequential. Dropping the returned future cancels the current
    /// attempt or wait and no further attempt is started.
    ///
    /// # Errors
    ///
    /// Returns a permanent error as soon as it occurs, or the last transient
    /// error once retries are exhausted.
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + std::fmt::Display,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    if !error.is_transient() {
                        debug!(attempt, error = %error, "Permanent failure, not retrying");
                        return Err(error);
                    }
                    if !self.should_retry(&error, attempt) {
                        warn!(attempts = attempt + 1, error = %error, "Retries exhausted");
                        return Err(error);
                    }
                    let delay = self.delay_for_attempt(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Get the maximum number of retries.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.config.max_retries
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &RetryConfig {
        &self.config
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::with_defaults()
    }
}
