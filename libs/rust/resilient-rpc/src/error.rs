//! Client-side error types.
//!
//! RPC failures are reported as [`tonic::Status`] and never converted into
//! [`ClientError`]. This type covers everything around the calls: endpoint
//! and policy configuration, connection open/close, and registry lookups.

use thiserror::Error;

/// Errors raised outside of an individual RPC.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ClientError {
    /// Endpoint host or port is unusable
    #[error("Invalid endpoint: {reason}")]
    InvalidEndpoint {
        /// Why the endpoint was rejected
        reason: String,
    },

    /// Retry or connection options are invalid
    #[error("Invalid client configuration: {reason}")]
    InvalidConfig {
        /// Why the configuration was rejected
        reason: String,
    },

    /// Opening the connection failed
    #[error("Failed to connect to {endpoint}: {reason}")]
    Connect {
        /// Endpoint that was dialed
        endpoint: String,
        /// Transport error description
        reason: String,
    },

    /// Closing the connection failed
    #[error("Failed to close connection for {service}: {reason}")]
    Close {
        /// Service whose connection failed to close
        service: String,
        /// Transport error description
        reason: String,
    },

    /// No active client is registered under the name
    #[error("No active client registered for service '{service}'")]
    NotRegistered {
        /// Requested service name
        service: String,
    },

    /// A client is already registered under the name
    #[error("A client is already registered for service '{service}'")]
    AlreadyRegistered {
        /// Conflicting service name
        service: String,
    },
}

impl ClientError {
    /// Create an invalid endpoint error.
    #[must_use]
    pub fn invalid_endpoint(reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create a connect error.
    #[must_use]
    pub fn connect(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Connect {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Create a close error.
    #[must_use]
    pub fn close(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Close {
            service: service.into(),
            reason: reason.into(),
        }
    }

    /// Create a registry-miss error.
    #[must_use]
    pub fn not_registered(service: impl Into<String>) -> Self {
        Self::NotRegistered {
            service: service.into(),
        }
    }

    /// Checks if this error is a failure of the connection resource itself.
    #[must_use]
    pub const fn is_lifecycle(&self) -> bool {
        matches!(self, Self::Connect { .. } | Self::Close { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClientError::not_registered("auth");
        assert_eq!(err.to_string(), "No active client registered for service 'auth'");

        let err = ClientError::connect("http://auth:50051", "connection refused");
        assert_eq!(
            err.to_string(),
            "Failed to connect to http://auth:50051: connection refused"
        );
    }

    #[test]
    fn test_lifecycle_classification() {
        assert!(ClientError::connect("x", "y").is_lifecycle());
        assert!(ClientError::close("auth", "y").is_lifecycle());
        assert!(!ClientError::not_registered("auth").is_lifecycle());
        assert!(!ClientError::invalid_config("bad").is_lifecycle());
    }
}
