//! Shared test utilities for auth-platform Rust services.
//!
//! This crate provides:
//! - Proptest generators for status codes and retry budgets
//! - A scripted mock connection
//! - Test fixtures for endpoints, policies and registries

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use generators::*;
pub use mocks::{MockCall, MockConnection, MockReply};
