//! Retrying client that routes every remote operation through one policy.
//!
//! [`RetryingClient::invoke`] is the single dispatch point. Typed
//! per-operation methods are generated with [`rpc_operations!`](crate::rpc_operations)
//! and only delegate to it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use prost::Message;
use tonic::Status;
use tracing::{debug, instrument};

use crate::connection::Connection;
use crate::retry::RetryPolicy;

/// Client wrapper that retries transient failures of any named operation.
///
/// Cloning is cheap; clones share the connection.
#[derive(Clone)]
pub struct RetryingClient {
    connection: Arc<dyn Connection>,
    policy: RetryPolicy,
}

impl RetryingClient {
    /// Wraps a connection with a retry policy.
    #[must_use]
    pub fn new(connection: Arc<dyn Connection>, policy: RetryPolicy) -> Self {
        Self { connection, policy }
    }

    /// Invokes a unary operation with retries.
    ///
    /// The request is encoded once and replayed on every attempt. Each
    /// attempt is bounded by `timeout`; an attempt that runs out of time
    /// fails with `DEADLINE_EXCEEDED` and is retried like any other
    /// transient failure.
    ///
    /// # Errors
    ///
    /// Returns the status of the last attempt, or `INTERNAL` if the
    /// response cannot be decoded as `Resp`.
    pub async fn invoke<Req, Resp>(
        &self,
        operation: &str,
        request: Req,
        timeout: Duration,
    ) -> Result<Resp, Status>
    where
        Req: Message,
        Resp: Message + Default,
    {
        let payload = Bytes::from(request.encode_to_vec());
        let body = self.invoke_raw(operation, payload, timeout).await?;
        Resp::decode(body).map_err(|e| {
            Status::internal(format!("failed to decode {operation} response: {e}"))
        })
    }

    /// Invokes a unary operation on an already-encoded payload.
    ///
    /// # Errors
    ///
    /// Returns the status of the last attempt.
    #[instrument(skip(self, payload), fields(payload_len = payload.len()))]
    pub async fn invoke_raw(
        &self,
        operation: &str,
        payload: Bytes,
        timeout: Duration,
    ) -> Result<Bytes, Status> {
        let result = self
            .policy
            .execute(|| self.attempt(operation, payload.clone(), timeout))
            .await;

        if let Err(status) = &result {
            debug!(code = ?status.code(), message = status.message(), "Operation failed");
        }
        result
    }

    async fn attempt(
        &self,
        operation: &str,
        payload: Bytes,
        timeout: Duration,
    ) -> Result<Bytes, Status> {
        match tokio::time::timeout(timeout, self.connection.unary(operation, payload, timeout)).await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(Status::deadline_exceeded(format!(
                "{operation} did not complete within {}ms",
                timeout.as_millis()
            ))),
        }
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Returns the shared connection.
    #[must_use]
    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }
}

impl fmt::Debug for RetryingClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryingClient")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Generates typed methods that delegate to [`RetryingClient::invoke`].
///
/// The target type must expose `fn retrying(&self) -> &RetryingClient`.
///
/// ```ignore
/// rpc_operations! {
///     impl AuthClient {
///         /// Issues a bearer token.
///         fn bearer_token => "BearerToken"(BearerTokenRequest) -> BearerTokenResponse;
///     }
/// }
/// ```
#[macro_export]
macro_rules! rpc_operations {
    (
        impl $client:ty {
            $(
                $(#[$meta:meta])*
                fn $method:ident => $operation:literal ($request:ty) -> $response:ty;
            )*
        }
    ) => {
        impl $client {
            $(
                $(#[$meta])*
                ///
                /// # Errors
                ///
                /// Returns the final status after retries.
                pub async fn $method(
                    &self,
                    request: $request,
                    timeout: ::std::time::Duration,
                ) -> ::std::result::Result<$response, $crate::tonic::Status> {
                    self.retrying().invoke($operation, request, timeout).await
                }
            )*

            /// Names of the operations exposed by this client.
            pub const OPERATIONS: &'static [&'static str] = &[$($operation),*];
        }
    };
}
