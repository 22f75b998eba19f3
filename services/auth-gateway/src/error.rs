//! Gateway error type.
//!
//! Wraps configuration, client lifecycle, and RPC failures so the binary can
//! report one error and exit non-zero.

use resilient_rpc::ClientError;
use thiserror::Error;
use tonic::{Code, Status};

use crate::auth::messages::ServingStatus;
use crate::config::ConfigError;

/// Errors surfaced by the gateway host process.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Client could not be opened, registered, resolved, or closed
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    /// Remote call failed after retries
    #[error("rpc failed with {}: {}", .0.code(), .0.message())]
    Rpc(Box<Status>),

    /// Startup health probe reported a non-serving state
    #[error("authentication service is not serving: {0:?}")]
    NotServing(ServingStatus),
}

impl GatewayError {
    /// gRPC code of an RPC failure, if this is one.
    #[must_use]
    pub fn rpc_code(&self) -> Option<Code> {
        match self {
            Self::Rpc(status) => Some(status.code()),
            _ => None,
        }
    }

    /// Whether the failure concerns acquiring or releasing the client.
    #[must_use]
    pub const fn is_lifecycle(&self) -> bool {
        matches!(self, Self::Client(err) if err.is_lifecycle())
    }
}

impl From<Status> for GatewayError {
    fn from(status: Status) -> Self {
        Self::Rpc(Box::new(status))
    }
}
