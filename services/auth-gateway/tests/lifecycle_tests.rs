//! Tests for the gateway's client lifetime: registration at startup,
//! release at shutdown, and cleanup on every failure path.

use std::sync::Arc;
use std::time::Duration;

use auth_gateway::auth::messages::{HealthCheckResponse, ServingStatus, Token};
use auth_gateway::{
    AUTH_REGISTRY_KEY, AppState, Config, GatewayError, ShutdownCoordinator, run_with_connection,
};
use bytes::Bytes;
use prost::Message;
use resilient_rpc::{ClientError, Connection, RetryingClient};
use test_utils::fixtures::{CALL_TIMEOUT, registry, retry_policy};
use test_utils::{MockConnection, MockReply};
use tonic::{Code, Status};

const HEALTH_CHECK: &str = "grpc.health.v1.Health/Check";

fn test_config() -> Config {
    Config {
        retry_interval_ms: 10,
        ..Config::default()
    }
}

fn health(status: ServingStatus) -> MockReply {
    MockReply::Respond(Bytes::from(
        HealthCheckResponse {
            status: status as i32,
        }
        .encode_to_vec(),
    ))
}

#[tokio::test]
async fn test_client_is_registered_until_shutdown() {
    let registry = registry();
    let mock = Arc::new(MockConnection::new());
    let coordinator = ShutdownCoordinator::new();
    let config = test_config();

    let gateway = run_with_connection(
        &config,
        Arc::clone(&registry),
        Arc::clone(&mock) as Arc<dyn Connection>,
        coordinator.subscribe().recv(),
    );

    let handler = async {
        while !registry.contains(AUTH_REGISTRY_KEY) {
            tokio::task::yield_now().await;
        }
        let state = AppState::new(Arc::clone(&registry), CALL_TIMEOUT);
        let client = state.auth_client().unwrap();
        let token = Token {
            token: "t".to_string(),
        };
        // The mock echoes, so the token comes back as the user id.
        let user = client.user(token, state.call_timeout()).await.unwrap();
        assert_eq!(user.id, "t");
        assert_eq!(mock.close_count(), 0);
        coordinator.trigger();
    };

    let (result, ()) = tokio::join!(gateway, handler);
    result.unwrap();

    assert!(registry.is_empty());
    assert_eq!(mock.close_count(), 1);
    assert!(matches!(
        AppState::new(registry, CALL_TIMEOUT).auth_client(),
        Err(ClientError::NotRegistered { .. })
    ));
}

#[tokio::test]
async fn test_serving_probe_then_immediate_shutdown() {
    let registry = registry();
    let mock = Arc::new(MockConnection::new());
    mock.script(HEALTH_CHECK, [health(ServingStatus::Serving)]).await;
    let config = Config {
        connect_eagerly: true,
        ..test_config()
    };

    run_with_connection(
        &config,
        Arc::clone(&registry),
        Arc::clone(&mock) as Arc<dyn Connection>,
        async {},
    )
    .await
    .unwrap();

    assert_eq!(mock.attempts(HEALTH_CHECK).await, 1);
    assert_eq!(mock.close_count(), 1);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_not_serving_probe_releases_client() {
    let registry = registry();
    let mock = Arc::new(MockConnection::new());
    mock.script(HEALTH_CHECK, [health(ServingStatus::NotServing)])
        .await;
    let config = Config {
        connect_eagerly: true,
        ..test_config()
    };

    let err = run_with_connection(
        &config,
        Arc::clone(&registry),
        Arc::clone(&mock) as Arc<dyn Connection>,
        std::future::pending(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, GatewayError::NotServing(ServingStatus::NotServing)));
    assert_eq!(mock.close_count(), 1);
    assert!(registry.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_probe_retries_then_releases_client() {
    let registry = registry();
    let mock = Arc::new(MockConnection::new());
    mock.fail_times(HEALTH_CHECK, &Status::unavailable("no route to host"), 2)
        .await;
    let config = Config {
        connect_eagerly: true,
        max_retries: 1,
        ..test_config()
    };

    let err = run_with_connection(
        &config,
        Arc::clone(&registry),
        Arc::clone(&mock) as Arc<dyn Connection>,
        std::future::pending(),
    )
    .await
    .unwrap_err();

    assert_eq!(err.rpc_code(), Some(Code::Unavailable));
    assert_eq!(mock.attempts(HEALTH_CHECK).await, 2);
    assert_eq!(mock.close_count(), 1);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_close_failure_is_reported_after_deregistration() {
    let registry = registry();
    let mock = Arc::new(MockConnection::failing_close());

    let err = run_with_connection(
        &test_config(),
        Arc::clone(&registry),
        Arc::clone(&mock) as Arc<dyn Connection>,
        async {},
    )
    .await
    .unwrap_err();

    assert!(err.is_lifecycle());
    assert_eq!(mock.close_count(), 1);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_registration_conflict_closes_new_connection() {
    let registry = registry();
    let existing = Arc::new(MockConnection::new());
    registry
        .register(
            AUTH_REGISTRY_KEY,
            RetryingClient::new(
                Arc::clone(&existing) as Arc<dyn Connection>,
                retry_policy(3, Duration::from_secs(1)),
            ),
        )
        .unwrap();

    let mock = Arc::new(MockConnection::new());
    let err = run_with_connection(
        &test_config(),
        Arc::clone(&registry),
        Arc::clone(&mock) as Arc<dyn Connection>,
        async {},
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        GatewayError::Client(ClientError::AlreadyRegistered { .. })
    ));
    assert_eq!(mock.close_count(), 1);
    assert_eq!(existing.close_count(), 0);
    assert!(registry.contains(AUTH_REGISTRY_KEY));
}

#[tokio::test]
async fn test_invalid_retry_settings_close_connection() {
    let registry = registry();
    let mock = Arc::new(MockConnection::new());
    let config = Config {
        retry_interval_ms: 0,
        ..Config::default()
    };

    let err = run_with_connection(
        &config,
        Arc::clone(&registry),
        Arc::clone(&mock) as Arc<dyn Connection>,
        async {},
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        GatewayError::Client(ClientError::InvalidConfig { .. })
    ));
    assert_eq!(mock.close_count(), 1);
    assert!(registry.is_empty());
}
