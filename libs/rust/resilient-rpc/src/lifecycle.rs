//! Scoped ownership of a client connection.
//!
//! Entering a scope wraps the connection in a [`RetryingClient`] and
//! registers it; leaving the scope deregisters it and closes the connection
//! exactly once, whichever way the scope ends.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{error, info, warn};

use crate::client::RetryingClient;
use crate::connection::{ConnectOptions, Connection, Endpoint, GrpcConnection};
use crate::error::ClientError;
use crate::registry::ClientRegistry;
use crate::retry::RetryPolicy;

/// Guard for an active, registered client.
///
/// Call [`ClientScope::exit`] to release it. A guard dropped without
/// `exit` (cancelled task, panic) still deregisters and schedules the close
/// on the current tokio runtime.
pub struct ClientScope {
    registry: Arc<ClientRegistry>,
    service: String,
    client: RetryingClient,
    connection: Arc<dyn Connection>,
    released: bool,
}

impl ClientScope {
    /// Wraps `connection` and registers the client under `service`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::AlreadyRegistered` if another scope owns the
    /// name. The connection is closed before the error is returned.
    pub async fn enter(
        registry: Arc<ClientRegistry>,
        service: impl Into<String>,
        connection: Arc<dyn Connection>,
        policy: RetryPolicy,
    ) -> Result<Self, ClientError> {
        let service = service.into();
        let client = RetryingClient::new(Arc::clone(&connection), policy);

        if let Err(err) = registry.register(service.clone(), client.clone()) {
            if let Err(close_err) = connection.close().await {
                warn!(service = %service, error = %close_err, "Failed to close rejected connection");
            }
            return Err(err);
        }

        info!(service = %service, "Client scope entered");
        Ok(Self {
            registry,
            service,
            client,
            connection,
            released: false,
        })
    }

    /// Returns the registered client.
    #[must_use]
    pub const fn client(&self) -> &RetryingClient {
        &self.client
    }

    /// Returns the service name the client is registered under.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Deregisters the client and closes the connection.
    ///
    /// # Errors
    ///
    /// Returns the connection's close error. The registry entry is removed
    /// regardless.
    pub async fn exit(mut self) -> Result<(), ClientError> {
        self.released = true;
        self.registry.deregister(&self.service);

        match self.connection.close().await {
            Ok(()) => {
                info!(service = %self.service, "Client scope exited");
                Ok(())
            }
            Err(err) => {
                error!(service = %self.service, error = %err, "Failed to close connection");
                Err(err)
            }
        }
    }
}

impl Drop for ClientScope {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.registry.deregister(&self.service);

        let pending = PendingClose {
            connection: Some(Arc::clone(&self.connection)),
            service: self.service.clone(),
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!(service = %self.service, "Client scope dropped without exit, closing in background");
                handle.spawn(pending.run());
            }
            Err(_) => {
                warn!(service = %self.service, "Client scope dropped outside a runtime, closing inline");
                futures::executor::block_on(pending.run());
            }
        }
    }
}

/// Close owed by a dropped [`ClientScope`].
///
/// If the task running it is discarded before its first poll, for example
/// by a runtime shutting down, the close happens inline on drop instead.
struct PendingClose {
    connection: Option<Arc<dyn Connection>>,
    service: String,
}

impl PendingClose {
    async fn run(mut self) {
        if let Some(connection) = self.connection.take() {
            close_logged(connection.as_ref(), &self.service).await;
        }
    }
}

impl Drop for PendingClose {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            futures::executor::block_on(close_logged(connection.as_ref(), &self.service));
        }
    }
}

async fn close_logged(connection: &dyn Connection, service: &str) {
    if let Err(err) = connection.close().await {
        error!(service = %service, error = %err, "Failed to close connection");
    }
}

impl std::fmt::Debug for ClientScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientScope")
            .field("service", &self.service)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

/// Runs `body` with a registered client and always releases it afterwards.
///
/// The scope is exited when the body returns `Ok`, returns `Err`, or
/// panics; a panic is resumed after cleanup. A body error takes precedence
/// over a close error, which is then only logged.
///
/// # Errors
///
/// Returns the entry error, the body's error, or the close error.
pub async fn with_client_scope<F, Fut, T, E>(
    registry: Arc<ClientRegistry>,
    service: impl Into<String>,
    connection: Arc<dyn Connection>,
    policy: RetryPolicy,
    body: F,
) -> Result<T, E>
where
    F: FnOnce(RetryingClient) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<ClientError>,
{
    let scope = ClientScope::enter(registry, service, connection, policy).await?;
    let client = scope.client().clone();

    let outcome = AssertUnwindSafe(async move { body(client).await })
        .catch_unwind()
        .await;
    let exited = scope.exit().await;

    match outcome {
        Err(panic) => std::panic::resume_unwind(panic),
        Ok(Err(err)) => {
            if let Err(close_err) = exited {
                warn!(error = %close_err, "Close failed after scope body error");
            }
            Err(err)
        }
        Ok(Ok(value)) => {
            exited?;
            Ok(value)
        }
    }
}

/// Opens a [`GrpcConnection`] to `endpoint` and enters a scope for it.
///
/// # Errors
///
/// Returns `ClientError::InvalidConfig` for an invalid retry policy, any
/// error from [`GrpcConnection::open`], or a registration conflict.
pub async fn open_scope(
    registry: Arc<ClientRegistry>,
    service: impl Into<String>,
    endpoint: Endpoint,
    options: ConnectOptions,
    policy: RetryPolicy,
) -> Result<ClientScope, ClientError> {
    policy.config().validate()?;
    let connection = GrpcConnection::open(endpoint, options).await?;
    ClientScope::enter(registry, service, Arc::new(connection), policy).await
}
