//! Typed client for the authentication service.
//!
//! Every adapter goes through the shared [`RetryingClient`], so all
//! operations get the same transient-failure retry policy.

pub mod messages;

use std::time::Duration;

use resilient_rpc::{RetryingClient, rpc_operations};
use tonic::Status;

use messages::{
    BearerTokenRequest, BearerTokenResponse, Empty, HealthCheckRequest, HealthCheckResponse,
    RegisterRequest, ResetPasswordRequest, ResetPasswordTokenRequest, ServingStatus, Token,
    TokenWithEmail, UpdateUserRequest, UserResponse, VerifyUserTokenRequest,
};

/// Fully qualified gRPC service name.
pub const AUTH_SERVICE_NAME: &str = "pkg.auth.Authentication";

/// Registry key under which the host registers the client.
pub const AUTH_REGISTRY_KEY: &str = "auth";

const HEALTH_CHECK: &str = "grpc.health.v1.Health/Check";

/// Client for `pkg.auth.Authentication`.
#[derive(Debug, Clone)]
pub struct AuthClient {
    inner: RetryingClient,
}

impl AuthClient {
    /// Wrap a retrying client bound to the authentication service.
    #[must_use]
    pub const fn new(inner: RetryingClient) -> Self {
        Self { inner }
    }

    /// Underlying retrying client.
    #[must_use]
    pub const fn retrying(&self) -> &RetryingClient {
        &self.inner
    }

    /// Probe the standard health endpoint of the server.
    ///
    /// # Errors
    ///
    /// Returns the final status after retries.
    pub async fn check_health(&self, timeout: Duration) -> Result<ServingStatus, Status> {
        let response: HealthCheckResponse = self
            .inner
            .invoke(HEALTH_CHECK, HealthCheckRequest::default(), timeout)
            .await?;
        Ok(response.status())
    }
}

rpc_operations! {
    impl AuthClient {
        /// Exchange credentials for a bearer token.
        fn bearer_token => "BearerToken"(BearerTokenRequest) -> BearerTokenResponse;
        /// Revoke a bearer token.
        fn revoke_bearer_token => "RevokeBearerToken"(Token) -> Empty;
        /// Create an account.
        fn register => "Register"(RegisterRequest) -> UserResponse;
        /// Set a new password with a reset token.
        fn reset_password => "ResetPassword"(ResetPasswordRequest) -> Empty;
        /// Issue a password reset token.
        fn reset_password_token => "ResetPasswordToken"(ResetPasswordTokenRequest) -> TokenWithEmail;
        /// Resolve the account behind a bearer token.
        fn user => "User"(Token) -> UserResponse;
        /// Update account details.
        fn update_user => "UpdateUser"(UpdateUserRequest) -> UserResponse;
        /// Mark an account as verified with a verification token.
        fn verify_user => "VerifyUser"(Token) -> UserResponse;
        /// Issue an email verification token.
        fn verify_user_token => "VerifyUserToken"(VerifyUserTokenRequest) -> TokenWithEmail;
    }
}
