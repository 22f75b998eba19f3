//! Message contract of the `pkg.auth.Authentication` service.
//!
//! Field numbers and types match `auth.proto` owned by the authentication
//! service. Empty strings mean "not set", as usual for proto3 scalars.

/// Empty request or response.
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct Empty {}

/// Opaque token.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct Token {
    /// Token value
    #[prost(string, tag = "1")]
    pub token: String,
}

/// Credentials exchanged for a bearer token.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct BearerTokenRequest {
    /// Account email
    #[prost(string, tag = "1")]
    pub email: String,
    /// Account password
    #[prost(string, tag = "2")]
    pub password: String,
}

/// Issued bearer token.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct BearerTokenResponse {
    /// Token value
    #[prost(string, tag = "1")]
    pub access_token: String,
    /// Token type, e.g. `bearer`
    #[prost(string, tag = "2")]
    pub token_type: String,
    /// Lifetime in seconds
    #[prost(int32, tag = "3")]
    pub expiry: i32,
}

/// New account details.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct RegisterRequest {
    /// Account email
    #[prost(string, tag = "1")]
    pub email: String,
    /// Account password
    #[prost(string, tag = "2")]
    pub password: String,
    /// Given name
    #[prost(string, tag = "3")]
    pub first_name: String,
    /// Family name
    #[prost(string, tag = "4")]
    pub last_name: String,
}

/// Password reset with a previously issued reset token.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ResetPasswordRequest {
    /// Reset token
    #[prost(string, tag = "1")]
    pub token: String,
    /// New password
    #[prost(string, tag = "2")]
    pub password: String,
}

/// Request for a password reset token.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ResetPasswordTokenRequest {
    /// Account email
    #[prost(string, tag = "1")]
    pub email: String,
}

/// Partial account update, authorised by a bearer token.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct UpdateUserRequest {
    /// Bearer token of the account
    #[prost(string, tag = "1")]
    pub token: String,
    /// New email
    #[prost(string, tag = "2")]
    pub email: String,
    /// New password
    #[prost(string, tag = "3")]
    pub password: String,
    /// New given name
    #[prost(string, tag = "4")]
    pub first_name: String,
    /// New family name
    #[prost(string, tag = "5")]
    pub last_name: String,
}

/// Account type with its granted scopes.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct UserType {
    /// Type name
    #[prost(string, tag = "1")]
    pub name: String,
    /// Granted scopes
    #[prost(string, repeated, tag = "2")]
    pub scopes: Vec<String>,
}

/// Account as returned by the service.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct UserResponse {
    /// Account id
    #[prost(string, tag = "1")]
    pub id: String,
    /// Account email
    #[prost(string, tag = "2")]
    pub email: String,
    /// Given name
    #[prost(string, tag = "3")]
    pub first_name: String,
    /// Family name
    #[prost(string, tag = "4")]
    pub last_name: String,
    /// Account type
    #[prost(message, optional, tag = "5")]
    pub user_type: Option<UserType>,
    /// Whether the account is active
    #[prost(bool, tag = "6")]
    pub is_active: bool,
    /// Whether the email is verified
    #[prost(bool, tag = "7")]
    pub is_verified: bool,
}

/// Request for an email verification token.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct VerifyUserTokenRequest {
    /// Account email
    #[prost(string, tag = "1")]
    pub email: String,
}

/// Token addressed to an account holder.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct TokenWithEmail {
    /// Token value
    #[prost(string, tag = "1")]
    pub token: String,
    /// Recipient email
    #[prost(string, tag = "2")]
    pub email: String,
    /// Recipient given name
    #[prost(string, tag = "3")]
    pub first_name: String,
    /// Recipient family name
    #[prost(string, tag = "4")]
    pub last_name: String,
}

/// `grpc.health.v1.HealthCheckRequest`.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct HealthCheckRequest {
    /// Service to check; empty for the server as a whole
    #[prost(string, tag = "1")]
    pub service: String,
}

/// `grpc.health.v1.HealthCheckResponse`.
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct HealthCheckResponse {
    /// Serving status
    #[prost(enumeration = "ServingStatus", tag = "1")]
    pub status: i32,
}

/// `grpc.health.v1.HealthCheckResponse.ServingStatus`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ServingStatus {
    /// Status not known
    Unknown = 0,
    /// Serving requests
    Serving = 1,
    /// Not serving requests
    NotServing = 2,
    /// Requested service is not known to the server
    ServiceUnknown = 3,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_user_response_wire_compatibility() {
        let user = UserResponse {
            id: "8d3c".to_string(),
            email: "jane@example.com".to_string(),
            user_type: Some(UserType {
                name: "admin".to_string(),
                scopes: vec!["read".to_string(), "write".to_string()],
            }),
            is_active: true,
            ..UserResponse::default()
        };

        let bytes = user.encode_to_vec();
        // Field 1, length-delimited.
        assert_eq!(bytes[0], 0x0a);
        assert_eq!(UserResponse::decode(bytes.as_slice()).unwrap(), user);
    }

    #[test]
    fn test_health_status_accessor() {
        let response = HealthCheckResponse {
            status: ServingStatus::Serving as i32,
        };
        assert_eq!(response.status(), ServingStatus::Serving);

        let response = HealthCheckResponse { status: 42 };
        assert_eq!(response.status(), ServingStatus::Unknown);
    }

    #[test]
    fn test_empty_encodes_to_nothing() {
        assert!(Empty {}.encode_to_vec().is_empty());
    }
}
