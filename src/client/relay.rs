//! Inbound relay: socket frames into the session message log.

use std::sync::Arc;

use tokio::task::JoinHandle;

use super::handle::{CloseReason, ConnectionHandle, Received};
use crate::domain::{Session, SessionRegistry};

/// Why a relay task stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayExit {
    /// The connection closed; the session was marked disconnected.
    Closed(CloseReason),
    /// The session moved on to a newer connection; this one was closed.
    Superseded,
}

/// Task that drains one [`ConnectionHandle`] into one [`Session`].
///
/// Each text frame becomes a server message, followed immediately by a
/// re-render and a scroll notification. When the connection ends the relay
/// removes the handle from the [`SessionRegistry`] and marks the session
/// disconnected; it is the only code path that deregisters an established
/// connection.
#[derive(Debug)]
pub struct InboundRelay {
    session: Arc<Session>,
    handle: Arc<ConnectionHandle>,
    registry: Arc<SessionRegistry>,
}

impl InboundRelay {
    /// Creates a relay for a handle that is already registered and marked
    /// connected on `session`.
    #[must_use]
    pub fn new(
        session: Arc<Session>,
        handle: Arc<ConnectionHandle>,
        registry: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            session,
            handle,
            registry,
        }
    }

    /// Runs the relay on its own task.
    #[must_use = "dropping the JoinHandle detaches the relay"]
    pub fn spawn(self) -> JoinHandle<RelayExit> {
        tokio::spawn(self.run())
    }

    /// Relays frames until the connection ends.
    pub async fn run(self) -> RelayExit {
        let session_id = self.session.id();
        let connection_id = self.handle.id();
        tracing::debug!(%session_id, %connection_id, "relay started");

        let reason = loop {
            match self.handle.receive_next().await {
                Received::Text(text) => {
                    let mut state = self.session.lock().await;
                    if !state.append_server_message(connection_id, text) {
                        drop(state);
                        self.registry.remove(connection_id);
                        self.handle.close().await;
                        tracing::debug!(%session_id, %connection_id, "relay superseded");
                        return RelayExit::Superseded;
                    }
                    self.session.notify_appended(&state);
                }
                Received::Closed(reason) => break reason,
            }
        };

        // Deregister under the session lock so nobody observes a connected
        // session whose handle is already gone, or the reverse.
        {
            let mut state = self.session.lock().await;
            self.registry.remove(connection_id);
            if state.mark_disconnected(connection_id) {
                self.session.notify_changed(&state);
            }
        }
        self.handle.close().await;

        tracing::info!(%session_id, %connection_id, %reason, "connection closed");
        RelayExit::Closed(reason)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use tokio_tungstenite::tungstenite::Message as Frame;

    use super::*;
    use crate::domain::{ConnectionId, Role, SessionId};
    use crate::test_support::{spawn_echo_server, spawn_scripted_server};

    const TIMEOUT: Duration = Duration::from_secs(5);

    async fn connected(url: &str) -> (Arc<Session>, Arc<ConnectionHandle>, Arc<SessionRegistry>) {
        let session = Arc::new(Session::new(SessionId::new(), url, 64));
        let registry = Arc::new(SessionRegistry::new());
        let Ok(handle) = ConnectionHandle::open(ConnectionId::new(), url, TIMEOUT).await else {
            panic!("connect failed");
        };
        let handle = Arc::new(handle);
        tokio_test::assert_ok!(registry.insert(Arc::clone(&handle)));
        {
            let mut state = session.lock().await;
            let (attempt, _) = state.begin_connect();
            assert!(state.mark_connected(attempt, handle.id()));
        }
        (session, handle, registry)
    }

    #[tokio::test]
    async fn relays_text_frames_in_order_then_disconnects() {
        let url = spawn_scripted_server(vec![
            Frame::text("one"),
            Frame::binary(vec![9_u8]),
            Frame::text("two"),
            Frame::text("three"),
        ])
        .await;
        let (session, handle, registry) = connected(&url).await;
        let id = handle.id();

        let relay = InboundRelay::new(Arc::clone(&session), handle, Arc::clone(&registry));
        let Ok(exit) = tokio::time::timeout(TIMEOUT, relay.run()).await else {
            panic!("relay did not finish");
        };
        assert_eq!(exit, RelayExit::Closed(CloseReason::Remote));

        let state = session.lock().await;
        let texts: Vec<&str> = state.messages().iter().map(|m| m.text()).collect();
        assert_eq!(texts, ["one", "two", "three"]);
        assert!(state.messages().iter().all(|m| m.role() == Role::Server));
        assert!(!state.connected());
        assert!(registry.lookup(id).is_none());
    }

    #[tokio::test]
    async fn each_append_notifies_once() {
        let url = spawn_scripted_server(vec![Frame::text("a"), Frame::text("b")]).await;
        let (session, handle, registry) = connected(&url).await;
        let mut rx = session.subscribe();

        let relay = InboundRelay::new(Arc::clone(&session), handle, registry);
        let _ = tokio::time::timeout(TIMEOUT, relay.run()).await;

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(event.event_type_str());
        }
        assert_eq!(
            kinds,
            [
                "state_changed",
                "scroll_to_latest",
                "state_changed",
                "scroll_to_latest",
                "state_changed",
            ]
        );
    }

    #[tokio::test]
    async fn local_close_ends_relay_and_deregisters() {
        let url = spawn_echo_server().await;
        let (session, handle, registry) = connected(&url).await;
        let id = handle.id();

        let relay = InboundRelay::new(
            Arc::clone(&session),
            Arc::clone(&handle),
            Arc::clone(&registry),
        );
        let task = relay.spawn();
        handle.close().await;

        let Ok(Ok(exit)) = tokio::time::timeout(TIMEOUT, task).await else {
            panic!("relay did not stop");
        };
        assert_eq!(exit, RelayExit::Closed(CloseReason::Local));
        assert!(!registry.contains(id));
        assert!(!session.lock().await.connected());
    }

    #[tokio::test]
    async fn superseded_relay_does_not_touch_new_epoch() {
        let url = spawn_scripted_server(vec![Frame::text("stale")]).await;
        let (session, handle, registry) = connected(&url).await;
        {
            let mut state = session.lock().await;
            let _ = state.begin_connect();
        }

        let relay = InboundRelay::new(Arc::clone(&session), handle, Arc::clone(&registry));
        let Ok(exit) = tokio::time::timeout(TIMEOUT, relay.run()).await else {
            panic!("relay did not finish");
        };
        assert_eq!(exit, RelayExit::Superseded);
        assert!(session.lock().await.messages().is_empty());
        assert!(registry.is_empty());
    }
}
