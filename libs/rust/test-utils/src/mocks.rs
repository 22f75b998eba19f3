//! Mock implementations for testing.
//!
//! [`MockConnection`] stands in for a gRPC channel: it replays scripted
//! failures per operation, echoes the request once a script is exhausted,
//! and records every attempt and close.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use resilient_rpc::{ClientError, Connection};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tonic::Status;

/// Scripted outcome of one attempt.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Fail with this status
    Fail(Status),
    /// Succeed with this payload
    Respond(Bytes),
    /// Take longer than any reasonable per-call timeout
    Hang,
}

/// One recorded attempt.
#[derive(Debug, Clone)]
pub struct MockCall {
    /// Operation name as passed to the connection
    pub operation: String,
    /// Per-call timeout passed to the connection
    pub timeout: Duration,
    /// When the attempt started
    pub started_at: Instant,
}

/// Mock connection for testing.
#[derive(Debug, Default)]
pub struct MockConnection {
    scripts: RwLock<HashMap<String, VecDeque<MockReply>>>,
    calls: RwLock<Vec<MockCall>>,
    closes: AtomicU32,
    fail_close: bool,
}

impl MockConnection {
    /// Create a new mock connection that echoes every request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock whose `close` always fails.
    #[must_use]
    pub fn failing_close() -> Self {
        Self {
            fail_close: true,
            ..Self::default()
        }
    }

    /// Queue replies for an operation; consumed in order, one per attempt.
    pub async fn script(&self, operation: &str, replies: impl IntoIterator<Item = MockReply>) {
        self.scripts
            .write()
            .await
            .entry(operation.to_string())
            .or_default()
            .extend(replies);
    }

    /// Queue `times` failures with `status` for an operation.
    pub async fn fail_times(&self, operation: &str, status: &Status, times: usize) {
        let replies = (0..times).map(|_| MockReply::Fail(status.clone()));
        self.script(operation, replies).await;
    }

    /// Get all recorded attempts.
    pub async fn calls(&self) -> Vec<MockCall> {
        self.calls.read().await.clone()
    }

    /// Get the number of attempts for an operation.
    pub async fn attempts(&self, operation: &str) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    /// Get the number of times `close` was called.
    #[must_use]
    pub fn close_count(&self) -> u32 {
        self.closes.load(Ordering::SeqCst)
    }

    async fn next_reply(&self, operation: &str) -> Option<MockReply> {
        self.scripts
            .write()
            .await
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn unary(
        &self,
        operation: &str,
        request: Bytes,
        timeout: Duration,
    ) -> Result<Bytes, Status> {
        self.calls.write().await.push(MockCall {
            operation: operation.to_string(),
            timeout,
            started_at: Instant::now(),
        });

        match self.next_reply(operation).await {
            Some(MockReply::Fail(status)) => Err(status),
            Some(MockReply::Respond(body)) => Ok(body),
            Some(MockReply::Hang) => {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                Err(Status::deadline_exceeded("mock hang elapsed"))
            }
            None => Ok(request),
        }
    }

    async fn close(&self) -> Result<(), ClientError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(ClientError::close("mock", "close failed"));
        }
        Ok(())
    }
}
