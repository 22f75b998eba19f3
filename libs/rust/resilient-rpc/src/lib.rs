//! Resilient RPC client library for auth-platform Rust services.
//!
//! This crate provides:
//! - Transient-failure classification of gRPC status codes
//! - A retry policy with a fixed (or optionally exponential) delay
//! - A connection abstraction over a tonic channel with opaque operation names
//! - A retrying client that routes every operation through the retry policy
//! - Scoped connection ownership with guaranteed close
//! - A registry of active clients keyed by service name

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod classify;
pub mod client;
pub mod connection;
pub mod error;
pub mod lifecycle;
pub mod registry;
pub mod retry;

pub use classify::{Classify, FailureClass, classify_code};
pub use client::RetryingClient;
pub use connection::{ConnectOptions, Connection, Endpoint, GrpcConnection, RawCodec};
pub use error::ClientError;
pub use lifecycle::{ClientScope, open_scope, with_client_scope};
pub use registry::ClientRegistry;
pub use retry::{Backoff, RetryConfig, RetryPolicy};

// Re-exported for generated operation adapters.
pub use prost;
pub use tonic;
