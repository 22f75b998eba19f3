//! Wiring between configuration, the client scope, and request handlers.
//!
//! The gateway owns exactly one authentication client for the life of the
//! process. It is registered under [`AUTH_REGISTRY_KEY`] at startup and
//! released when the shutdown future resolves.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use resilient_rpc::{ClientError, ClientRegistry, ClientScope, Connection, RetryPolicy, open_scope};
use tracing::{error, info, warn};

use crate::auth::messages::ServingStatus;
use crate::auth::{AUTH_REGISTRY_KEY, AuthClient};
use crate::config::Config;
use crate::error::GatewayError;

/// Shared state handed to request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    registry: Arc<ClientRegistry>,
    call_timeout: Duration,
}

impl AppState {
    /// Creates state over an existing registry.
    #[must_use]
    pub const fn new(registry: Arc<ClientRegistry>, call_timeout: Duration) -> Self {
        Self {
            registry,
            call_timeout,
        }
    }

    /// Registry of active clients.
    #[must_use]
    pub const fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Per-attempt deadline for handler calls.
    #[must_use]
    pub const fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Resolves the authentication client.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotRegistered` outside the client's lifetime.
    pub fn auth_client(&self) -> Result<AuthClient, ClientError> {
        self.registry.get(AUTH_REGISTRY_KEY).map(AuthClient::new)
    }
}

/// Runs the gateway against the configured authentication service until
/// `shutdown` resolves.
///
/// # Errors
///
/// Returns [`GatewayError`] if the client cannot be opened, the startup
/// health probe fails, or the connection cannot be closed.
pub async fn run<S>(config: &Config, shutdown: S) -> Result<(), GatewayError>
where
    S: Future<Output = ()>,
{
    let registry = Arc::new(ClientRegistry::new());
    let scope = open_scope(
        Arc::clone(&registry),
        AUTH_REGISTRY_KEY,
        config.endpoint()?,
        config.connect_options(),
        RetryPolicy::new(config.retry_config()),
    )
    .await?;

    serve(config, AppState::new(registry, config.call_timeout()), scope, shutdown).await
}

/// Same as [`run`] over an already opened connection and a caller-owned
/// registry.
///
/// # Errors
///
/// See [`run`].
pub async fn run_with_connection<S>(
    config: &Config,
    registry: Arc<ClientRegistry>,
    connection: Arc<dyn Connection>,
    shutdown: S,
) -> Result<(), GatewayError>
where
    S: Future<Output = ()>,
{
    let retry = config.retry_config();
    if let Err(err) = retry.validate() {
        if let Err(close_err) = connection.close().await {
            warn!(error = %close_err, "Failed to close unused connection");
        }
        return Err(err.into());
    }

    let scope = ClientScope::enter(
        Arc::clone(&registry),
        AUTH_REGISTRY_KEY,
        connection,
        RetryPolicy::new(retry),
    )
    .await?;

    serve(config, AppState::new(registry, config.call_timeout()), scope, shutdown).await
}

async fn serve<S>(
    config: &Config,
    state: AppState,
    scope: ClientScope,
    shutdown: S,
) -> Result<(), GatewayError>
where
    S: Future<Output = ()>,
{
    if config.connect_eagerly {
        if let Err(err) = probe(&state).await {
            if let Err(close_err) = release(scope, config.shutdown_timeout()).await {
                warn!(error = %close_err, "Failed to release client after failed probe");
            }
            return Err(err);
        }
    }

    info!(service = AUTH_REGISTRY_KEY, "Auth gateway ready");
    shutdown.await;
    info!("Shutdown requested, releasing client");

    release(scope, config.shutdown_timeout()).await
}

async fn probe(state: &AppState) -> Result<(), GatewayError> {
    let client = state.auth_client()?;
    match client.check_health(state.call_timeout()).await? {
        ServingStatus::Serving => {
            info!("Authentication service is serving");
            Ok(())
        }
        status => {
            error!(?status, "Authentication service is not serving");
            Err(GatewayError::NotServing(status))
        }
    }
}

async fn release(scope: ClientScope, timeout: Duration) -> Result<(), GatewayError> {
    let service = scope.service().to_string();
    match tokio::time::timeout(timeout, scope.exit()).await {
        Ok(result) => result.map_err(GatewayError::from),
        Err(_) => {
            warn!(service = %service, ?timeout, "Shutdown timeout reached while closing client");
            Err(ClientError::close(service, "close timed out").into())
        }
    }
}
