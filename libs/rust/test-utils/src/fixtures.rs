//! Test fixtures with sample configuration.
//!
//! Pre-built retry policies, mock-backed clients and registries.

use std::sync::Arc;
use std::time::Duration;

use resilient_rpc::{ClientRegistry, RetryConfig, RetryPolicy, RetryingClient};

use crate::mocks::MockConnection;

/// Per-call timeout used in tests.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Retry policy with the given budget and interval.
#[must_use]
pub fn retry_policy(max_retries: u32, retry_interval: Duration) -> RetryPolicy {
    RetryPolicy::new(
        RetryConfig::default()
            .with_max_retries(max_retries)
            .with_retry_interval(retry_interval),
    )
}

/// Retrying client over a fresh mock connection.
#[must_use]
pub fn mock_client(max_retries: u32) -> (Arc<MockConnection>, RetryingClient) {
    let connection = Arc::new(MockConnection::new());
    let client = RetryingClient::new(
        Arc::clone(&connection) as Arc<dyn resilient_rpc::Connection>,
        retry_policy(max_retries, Duration::from_secs(1)),
    );
    (connection, client)
}

/// Empty shared registry.
#[must_use]
pub fn registry() -> Arc<ClientRegistry> {
    Arc::new(ClientRegistry::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures() {
        assert_eq!(retry_policy(2, Duration::from_millis(10)).max_retries(), 2);
        assert!(registry().is_empty());
    }
}
