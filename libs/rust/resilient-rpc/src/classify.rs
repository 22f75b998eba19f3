//! Transient-failure classification for RPC outcomes.
//!
//! Every failed attempt is classified as either transient (worth retrying)
//! or permanent (surfaced to the caller immediately).

use tonic::{Code, Status};

/// Classification of a failed RPC attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// Transport or connectivity condition expected to resolve on its own
    Transient,
    /// Failure caused by the request itself; retrying will not help
    Permanent,
}

impl FailureClass {
    /// Returns `true` for [`FailureClass::Transient`].
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Transient)
    }
}

/// Classifies a gRPC status code.
///
/// Only `UNAVAILABLE` and `DEADLINE_EXCEEDED` are transient. The rule is
/// identical for every operation.
///
/// # Examples
///
/// ```
/// use resilient_rpc::{classify_code, FailureClass};
/// use tonic::Code;
///
/// assert_eq!(classify_code(Code::Unavailable), FailureClass::Transient);
/// assert_eq!(classify_code(Code::InvalidArgument), FailureClass::Permanent);
/// ```
#[must_use]
pub const fn classify_code(code: Code) -> FailureClass {
    match code {
        Code::Unavailable | Code::DeadlineExceeded => FailureClass::Transient,
        _ => FailureClass::Permanent,
    }
}

/// Errors the retry executor knows how to classify.
pub trait Classify {
    /// Returns the failure class of this error.
    fn failure_class(&self) -> FailureClass;

    /// Checks if this error is retryable.
    fn is_transient(&self) -> bool {
        self.failure_class().is_transient()
    }
}

impl Classify for Status {
    fn failure_class(&self) -> FailureClass {
        classify_code(self.code())
    }
}
