//! Registry of active clients keyed by logical service name.
//!
//! Lookups load an immutable snapshot without locking. Writes swap in a new
//! snapshot and only happen when a client scope is entered or exited.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, info};

use crate::client::RetryingClient;
use crate::error::ClientError;

type Entries = HashMap<String, RetryingClient>;

/// Context object mapping service names to their active client.
#[derive(Default)]
pub struct ClientRegistry {
    entries: ArcSwap<Entries>,
}

impl ClientRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client under `service`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::AlreadyRegistered` if the name is taken.
    pub fn register(
        &self,
        service: impl Into<String>,
        client: RetryingClient,
    ) -> Result<(), ClientError> {
        let service = service.into();
        let mut conflict = false;

        self.entries.rcu(|current| {
            conflict = current.contains_key(&service);
            if conflict {
                return Arc::clone(current);
            }
            let mut next = Entries::clone(current);
            next.insert(service.clone(), client.clone());
            Arc::new(next)
        });

        if conflict {
            return Err(ClientError::AlreadyRegistered { service });
        }
        info!(service = %service, "Client registered");
        Ok(())
    }

    /// Removes the client registered under `service`.
    ///
    /// Returns the removed client, if any.
    pub fn deregister(&self, service: &str) -> Option<RetryingClient> {
        let mut removed = None;

        self.entries.rcu(|current| {
            if !current.contains_key(service) {
                removed = None;
                return Arc::clone(current);
            }
            let mut next = Entries::clone(current);
            removed = next.remove(service);
            Arc::new(next)
        });

        if removed.is_some() {
            info!(service = %service, "Client deregistered");
        } else {
            debug!(service = %service, "No client to deregister");
        }
        removed
    }

    /// Resolves the active client for `service`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotRegistered` when no scope for `service` is
    /// active.
    pub fn get(&self, service: &str) -> Result<RetryingClient, ClientError> {
        self.entries
            .load()
            .get(service)
            .cloned()
            .ok_or_else(|| ClientError::not_registered(service))
    }

    /// Checks if a client is registered under `service`.
    #[must_use]
    pub fn contains(&self, service: &str) -> bool {
        self.entries.load().contains_key(service)
    }

    /// Returns the registered service names, sorted.
    #[must_use]
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.load().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of registered clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    /// Checks if no client is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.load().is_empty()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.store(Arc::new(Entries::new()));
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("services", &self.service_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Connection;
    use crate::retry::RetryPolicy;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::time::Duration;
    use tonic::Status;

    struct NullConnection;

    #[async_trait]
    impl Connection for NullConnection {
        async fn unary(&self, _: &str, request: Bytes, _: Duration) -> Result<Bytes, Status> {
            Ok(request)
        }

        async fn close(&self) -> Result<(), ClientError> {
            Ok(())
        }
    }

    fn client() -> RetryingClient {
        RetryingClient::new(Arc::new(NullConnection), RetryPolicy::with_defaults())
    }

    #[test]
    fn test_empty_registry() {
        let registry = ClientRegistry::new();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.get("auth"),
            Err(ClientError::NotRegistered { service }) if service == "auth"
        ));
    }

    #[test]
    fn test_register_and_get() {
        let registry = ClientRegistry::new();
        tokio_test::assert_ok!(registry.register("auth", client()));

        assert!(registry.contains("auth"));
        assert!(registry.get("auth").is_ok());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let registry = ClientRegistry::new();
        registry.register("auth", client()).unwrap();

        let result = registry.register("auth", client());
        assert!(matches!(result, Err(ClientError::AlreadyRegistered { .. })));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_deregister() {
        let registry = ClientRegistry::new();
        registry.register("auth", client()).unwrap();
        registry.register("email", client()).unwrap();

        assert!(registry.deregister("auth").is_some());
        assert!(registry.deregister("auth").is_none());
        assert_eq!(registry.service_names(), vec!["email".to_string()]);
    }

    #[test]
    fn test_clear() {
        let registry = ClientRegistry::new();
        registry.register("auth", client()).unwrap();
        registry.register("email", client()).unwrap();
        registry.clear();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_lookups() {
        let registry = Arc::new(ClientRegistry::new());
        registry.register("auth", client()).unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move { registry.get("auth").is_ok() }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }
    }
}
