//! Concurrent storage of live outbound connections.
//!
//! [`SessionRegistry`] maps each [`ConnectionId`] to the
//! [`ConnectionHandle`] that owns the socket. It is backed by a sharded
//! [`DashMap`], so sessions inserting, looking up or removing their own
//! entries never serialize behind one process-wide lock.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::ConnectionId;
use crate::client::ConnectionHandle;
use crate::error::GatewayError;

/// Process-wide table of live connections.
///
/// Constructed once at startup and shared as `Arc<SessionRegistry>`.
///
/// # Concurrency
///
/// - Operations on different connections proceed in parallel.
/// - No method awaits network I/O while holding a shard lock.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    handles: DashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handles: DashMap::new(),
        }
    }

    /// Registers a live handle under its own connection id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DuplicateSession`] if the id is already
    /// registered. Ids are minted fresh per connection, so this signals a
    /// bug; the existing entry is left untouched.
    pub fn insert(&self, handle: Arc<ConnectionHandle>) -> Result<(), GatewayError> {
        let id = handle.id();
        match self.handles.entry(id) {
            Entry::Occupied(_) => Err(GatewayError::DuplicateSession(*id.as_uuid())),
            Entry::Vacant(slot) => {
                slot.insert(handle);
                Ok(())
            }
        }
    }

    /// Returns the handle registered under `id`, if any.
    #[must_use]
    pub fn lookup(&self, id: ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.handles.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Removes and returns the handle registered under `id`. No-op if absent.
    pub fn remove(&self, id: ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.handles.remove(&id).map(|(_, handle)| handle)
    }

    /// Returns `true` if `id` is registered.
    #[must_use]
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.handles.contains_key(&id)
    }

    /// Returns the number of live connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns `true` if no connection is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Closes every registered handle.
    ///
    /// Entries are removed by their relays as they observe the closure.
    /// Returns the number of handles closed.
    pub async fn close_all(&self) -> usize {
        let handles: Vec<Arc<ConnectionHandle>> = self
            .handles
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for handle in &handles {
            handle.close().await;
        }
        handles.len()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::test_support::spawn_echo_server;

    async fn open_handle() -> Arc<ConnectionHandle> {
        let url = spawn_echo_server().await;
        let Ok(handle) =
            ConnectionHandle::open(ConnectionId::new(), &url, Duration::from_secs(5)).await
        else {
            panic!("echo server should accept connections");
        };
        Arc::new(handle)
    }

    #[tokio::test]
    async fn insert_and_lookup() {
        let registry = SessionRegistry::new();
        let handle = open_handle().await;
        let id = handle.id();

        assert!(registry.insert(handle).is_ok());
        assert!(registry.contains(id));
        let Some(found) = registry.lookup(id) else {
            panic!("handle should be registered");
        };
        assert_eq!(found.id(), id);
    }

    #[tokio::test]
    async fn duplicate_insert_fails_fast() {
        let registry = SessionRegistry::new();
        let handle = open_handle().await;
        let id = handle.id();

        assert!(registry.insert(Arc::clone(&handle)).is_ok());
        let result = registry.insert(handle);
        assert!(matches!(result, Err(GatewayError::DuplicateSession(uuid)) if uuid == *id.as_uuid()));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn lookup_missing_returns_none() {
        let registry = SessionRegistry::new();
        assert!(registry.lookup(ConnectionId::new()).is_none());
    }

    #[tokio::test]
    async fn remove_is_noop_when_absent() {
        let registry = SessionRegistry::new();
        assert!(registry.remove(ConnectionId::new()).is_none());

        let handle = open_handle().await;
        let id = handle.id();
        tokio_test::assert_ok!(registry.insert(handle));
        assert!(registry.remove(id).is_some());
        assert!(registry.lookup(id).is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn close_all_closes_every_handle() {
        let registry = SessionRegistry::new();
        let a = open_handle().await;
        let b = open_handle().await;
        tokio_test::assert_ok!(registry.insert(Arc::clone(&a)));
        tokio_test::assert_ok!(registry.insert(Arc::clone(&b)));

        assert_eq!(registry.close_all().await, 2);
        assert!(a.is_closed());
        assert!(b.is_closed());
    }

    #[tokio::test]
    async fn concurrent_sessions_do_not_interfere() {
        let registry = Arc::new(SessionRegistry::new());
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            let handle = open_handle().await;
            tasks.push(tokio::spawn(async move {
                let id = handle.id();
                registry.insert(handle).is_ok()
                    && registry.lookup(id).is_some()
                    && registry.remove(id).is_some()
            }));
        }
        for task in tasks {
            assert!(matches!(task.await, Ok(true)));
        }
        assert!(registry.is_empty());
    }
}
