//! Property-based tests for the authentication client.
//!
//! Every operation of the service shares the same retry behaviour, so the
//! properties are checked against operations drawn from the full list.

use std::sync::Arc;
use std::time::Duration;

use auth_gateway::AuthClient;
use bytes::Bytes;
use proptest::prelude::*;
use resilient_rpc::{Connection, RetryingClient};
use test_utils::MockConnection;
use test_utils::fixtures::{CALL_TIMEOUT, retry_policy};
use test_utils::generators::{permanent_code_strategy, retry_budget_strategy, transient_code_strategy};
use tokio::time::Instant;
use tonic::Status;

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

fn operation_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(AuthClient::OPERATIONS)
}

fn client(max_retries: u32, interval: Duration) -> (Arc<MockConnection>, AuthClient) {
    let mock = Arc::new(MockConnection::new());
    let inner = RetryingClient::new(
        Arc::clone(&mock) as Arc<dyn Connection>,
        retry_policy(max_retries, interval),
    );
    (mock, AuthClient::new(inner))
}

// k transient failures within the budget take k + 1 attempts and k waits.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_every_operation_recovers_within_budget(
        operation in operation_strategy(),
        (max_retries, k) in retry_budget_strategy(),
        code in transient_code_strategy(),
        interval_ms in 1u64..1500,
    ) {
        let rt = paused_runtime();
        let interval = Duration::from_millis(interval_ms);
        let (attempts, result, elapsed) = rt.block_on(async {
            let (mock, client) = client(max_retries, interval);
            mock.fail_times(operation, &Status::new(code, "transient"), k as usize).await;

            let start = Instant::now();
            let result = client
                .retrying()
                .invoke_raw(operation, Bytes::from_static(b"payload"), CALL_TIMEOUT)
                .await;
            (mock.attempts(operation).await, result, start.elapsed())
        });

        prop_assert_eq!(attempts, k as usize + 1);
        prop_assert_eq!(result.unwrap(), Bytes::from_static(b"payload"));
        prop_assert_eq!(elapsed, interval * k);
    }
}

// A permanent failure on any operation is returned after exactly one attempt.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_every_operation_fails_fast_on_permanent_error(
        operation in operation_strategy(),
        max_retries in 0u32..6,
        code in permanent_code_strategy(),
    ) {
        let rt = paused_runtime();
        let (attempts, status, elapsed) = rt.block_on(async {
            let (mock, client) = client(max_retries, Duration::from_secs(1));
            mock.fail_times(operation, &Status::new(code, "rejected"), 1).await;

            let start = Instant::now();
            let result = client
                .retrying()
                .invoke_raw(operation, Bytes::new(), CALL_TIMEOUT)
                .await;
            (mock.attempts(operation).await, result.unwrap_err(), start.elapsed())
        });

        prop_assert_eq!(attempts, 1);
        prop_assert_eq!(status.code(), code);
        prop_assert_eq!(status.message(), "rejected");
        prop_assert_eq!(elapsed, Duration::ZERO);
    }
}
