//! Shared proptest generators.
//!
//! Strategies for gRPC status codes, operation names and retry budgets.

use proptest::prelude::*;
use tonic::Code;

/// Generate any gRPC status code.
pub fn status_code_strategy() -> impl Strategy<Value = Code> {
    (0i32..=16).prop_map(Code::from_i32)
}

/// Generate a transient status code.
pub fn transient_code_strategy() -> impl Strategy<Value = Code> {
    prop_oneof![Just(Code::Unavailable), Just(Code::DeadlineExceeded)]
}

/// Generate a permanent status code.
pub fn permanent_code_strategy() -> impl Strategy<Value = Code> {
    status_code_strategy().prop_filter("permanent codes only", |code| {
        !matches!(code, Code::Unavailable | Code::DeadlineExceeded)
    })
}

/// Generate a PascalCase operation name.
pub fn operation_name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-zA-Z]{2,20}"
}

/// Generate a retry budget and a failure count within it.
pub fn retry_budget_strategy() -> impl Strategy<Value = (u32, u32)> {
    (0u32..6).prop_flat_map(|max| (Just(max), 0..=max))
}
