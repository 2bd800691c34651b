//! Session service: maps UI events onto session operations.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::client::{ConnectionHandle, InboundRelay, OutboundDispatcher, SendOutcome};
use crate::config::SessionSettings;
use crate::domain::{ConnectionId, Session, SessionId, SessionRegistry, SessionSnapshot, UiEvent};
use crate::error::GatewayError;

/// Orchestration layer for all session operations.
///
/// Owns the table of UI sessions and references the injected
/// [`SessionRegistry`] of live connections. Every mutation follows the
/// pattern: acquire the session lock → transition the state → publish UI
/// events → release. Network handshakes run outside the lock.
#[derive(Debug)]
pub struct SessionService {
    sessions: DashMap<SessionId, Arc<Session>>,
    registry: Arc<SessionRegistry>,
    dispatcher: OutboundDispatcher,
    settings: SessionSettings,
}

impl SessionService {
    /// Creates a new `SessionService`.
    #[must_use]
    pub fn new(registry: Arc<SessionRegistry>, settings: SessionSettings) -> Self {
        let dispatcher = OutboundDispatcher::new(Arc::clone(&registry), settings.send_timeout);
        Self {
            sessions: DashMap::new(),
            registry,
            dispatcher,
            settings,
        }
    }

    /// Returns a reference to the inner [`SessionRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Returns the settings applied to new sessions.
    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Opens a new idle session targeting the default server URL.
    pub async fn create_session(&self) -> SessionSnapshot {
        let session_id = SessionId::new();
        let session = Arc::new(Session::new(
            session_id,
            self.settings.default_server_url.as_str(),
            self.settings.ui_event_capacity,
        ));
        let snapshot = session.snapshot().await;
        self.sessions.insert(session_id, session);
        tracing::info!(%session_id, "session created");
        snapshot
    }

    /// Returns the session with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] if no such session exists.
    pub fn session(&self, session_id: SessionId) -> Result<Arc<Session>, GatewayError> {
        self.sessions
            .get(&session_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(GatewayError::SessionNotFound(*session_id.as_uuid()))
    }

    /// Returns a snapshot of the session.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] if no such session exists.
    pub async fn snapshot(&self, session_id: SessionId) -> Result<SessionSnapshot, GatewayError> {
        Ok(self.session(session_id)?.snapshot().await)
    }

    /// Returns snapshots of all sessions, oldest first.
    pub async fn list_sessions(&self) -> Vec<SessionSnapshot> {
        let mut sessions: Vec<Arc<Session>> = self
            .sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        sessions.sort_by_key(|session| session.created_at());

        let mut snapshots = Vec::with_capacity(sessions.len());
        for session in sessions {
            snapshots.push(session.snapshot().await);
        }
        snapshots
    }

    /// Subscribes to the session's UI events.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] if no such session exists.
    pub fn subscribe(
        &self,
        session_id: SessionId,
    ) -> Result<broadcast::Receiver<UiEvent>, GatewayError> {
        Ok(self.session(session_id)?.subscribe())
    }

    /// Page (re)load: re-derives connectivity from the registry.
    ///
    /// A session that believes it is connected but whose handle is gone
    /// falls back to idle.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] if no such session exists.
    pub async fn on_page_load(&self, session_id: SessionId) -> Result<SessionSnapshot, GatewayError> {
        let session = self.session(session_id)?;
        let mut state = session.lock().await;
        let live = state
            .connection_id()
            .is_some_and(|id| self.registry.contains(id));
        if state.reconcile(live) {
            session.notify_changed(&state);
        }
        Ok(state.snapshot(session_id))
    }

    /// Replaces the session's target server URL.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] if no such session exists.
    pub async fn update_server_url(
        &self,
        session_id: SessionId,
        value: String,
    ) -> Result<SessionSnapshot, GatewayError> {
        let session = self.session(session_id)?;
        let mut state = session.lock().await;
        state.set_server_url(value);
        session.notify_changed(&state);
        Ok(state.snapshot(session_id))
    }

    /// Replaces the session's outbound draft.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] if no such session exists.
    pub async fn update_message_buffer(
        &self,
        session_id: SessionId,
        value: String,
    ) -> Result<SessionSnapshot, GatewayError> {
        let session = self.session(session_id)?;
        let mut state = session.lock().await;
        state.set_message_buffer(value);
        session.notify_changed(&state);
        Ok(state.snapshot(session_id))
    }

    /// Connects the session to its current server URL.
    ///
    /// The message log is cleared and published before the handshake
    /// starts. On success the handle is registered, the session marked
    /// connected and an [`InboundRelay`] spawned, in that order. A
    /// connection the session already owned is closed first.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::SessionNotFound`] if no such session exists.
    /// - [`GatewayError::ConnectionError`] if the handshake fails; the
    ///   session is left idle and disconnected.
    /// - [`GatewayError::ConnectSuperseded`] if another connect on the
    ///   same session started, or the session was ended, while this one
    ///   was in flight.
    /// - [`GatewayError::DuplicateSession`] if the fresh connection id was
    ///   already registered.
    pub async fn connect(&self, session_id: SessionId) -> Result<ConnectionId, GatewayError> {
        let session = self.session(session_id)?;

        let (attempt, superseded, url) = {
            let mut state = session.lock().await;
            let (attempt, superseded) = state.begin_connect();
            session.notify_changed(&state);
            (attempt, superseded, state.server_url().to_string())
        };
        if let Some(old) = superseded
            && let Some(handle) = self.registry.lookup(old)
        {
            handle.close().await;
        }

        let connection_id = ConnectionId::new();
        let handle =
            match ConnectionHandle::open(connection_id, &url, self.settings.connect_timeout).await {
                Ok(handle) => Arc::new(handle),
                Err(err) => {
                    let mut state = session.lock().await;
                    if state.fail_connect(attempt) {
                        session.notify_changed(&state);
                    }
                    tracing::warn!(%session_id, url = %url, error = %err, "connect failed");
                    return Err(err);
                }
            };

        if let Err(err) = self.registry.insert(Arc::clone(&handle)) {
            handle.close().await;
            let mut state = session.lock().await;
            if state.fail_connect(attempt) {
                session.notify_changed(&state);
            }
            return Err(err);
        }

        let accepted = {
            let mut state = session.lock().await;
            let accepted = state.mark_connected(attempt, connection_id);
            if accepted {
                session.notify_changed(&state);
            }
            accepted
        };
        if !accepted {
            self.registry.remove(connection_id);
            handle.close().await;
            tracing::debug!(%session_id, %connection_id, "connect superseded");
            return Err(GatewayError::ConnectSuperseded);
        }

        drop(
            InboundRelay::new(
                Arc::clone(&session),
                Arc::clone(&handle),
                Arc::clone(&self.registry),
            )
            .spawn(),
        );

        tracing::info!(%session_id, %connection_id, url = %url, "session connected");
        Ok(connection_id)
    }

    /// Submits the session's draft to its live connection.
    ///
    /// Delivery failures are reported through [`SendOutcome`], never as an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] if no such session exists.
    pub async fn submit_message(&self, session_id: SessionId) -> Result<SendOutcome, GatewayError> {
        let session = self.session(session_id)?;
        Ok(self.dispatcher.submit(&session).await)
    }

    /// Closes the session's live connection, if any.
    ///
    /// The relay observes the closure and marks the session disconnected.
    /// Returns `true` if a connection was closed.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] if no such session exists.
    pub async fn disconnect(&self, session_id: SessionId) -> Result<bool, GatewayError> {
        let session = self.session(session_id)?;
        let connection_id = session.lock().await.connection_id();
        let Some(handle) = connection_id.and_then(|id| self.registry.lookup(id)) else {
            return Ok(false);
        };
        handle.close().await;
        tracing::info!(
            %session_id,
            connection_id = %handle.id(),
            url = handle.url(),
            "disconnect requested"
        );
        Ok(true)
    }

    /// Ends the session, closing its connection.
    ///
    /// A connect still in flight is invalidated under the session lock; when
    /// its handshake completes it deregisters and closes its own handle.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] if no such session exists.
    pub async fn end_session(&self, session_id: SessionId) -> Result<(), GatewayError> {
        let (_, session) = self
            .sessions
            .remove(&session_id)
            .ok_or(GatewayError::SessionNotFound(*session_id.as_uuid()))?;
        let connection_id = session.lock().await.end();
        if let Some(handle) = connection_id.and_then(|id| self.registry.lookup(id)) {
            handle.close().await;
        }
        tracing::info!(%session_id, "session ended");
        Ok(())
    }

    /// Returns the number of open sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Closes every live connection. Called once on process shutdown.
    pub async fn shutdown(&self) {
        let closed = self.registry.close_all().await;
        tracing::info!(closed, "closed live connections");
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::{ConnectionStatus, Message};
    use crate::test_support::{spawn_echo_server, spawn_slow_handshake_server, unreachable_url};

    fn make_service() -> SessionService {
        let settings = SessionSettings {
            connect_timeout: Duration::from_secs(5),
            ..SessionSettings::default()
        };
        SessionService::new(Arc::new(SessionRegistry::new()), settings)
    }

    async fn wait_for_messages(service: &SessionService, id: SessionId, count: usize) {
        let wait = async {
            loop {
                let Ok(snapshot) = service.snapshot(id).await else {
                    panic!("session vanished");
                };
                if snapshot.messages.len() >= count {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };
        if tokio::time::timeout(Duration::from_secs(5), wait).await.is_err() {
            panic!("timed out waiting for {count} messages");
        }
    }

    #[tokio::test]
    async fn create_session_uses_default_url() {
        let service = make_service();
        let snapshot = service.create_session().await;
        assert_eq!(snapshot.server_url, service.settings().default_server_url);
        assert!(!snapshot.connected);
        assert_eq!(service.session_count(), 1);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let service = make_service();
        let result = service.connect(SessionId::new()).await;
        assert!(matches!(result, Err(GatewayError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn connect_publishes_clean_slate_before_handshake() {
        let service = make_service();
        let id = service.create_session().await.session_id;
        let _ = service.update_server_url(id, unreachable_url().await).await;
        let Ok(mut rx) = service.subscribe(id) else {
            panic!("subscribe failed");
        };

        let _ = service.connect(id).await;

        let Ok(UiEvent::StateChanged { snapshot, .. }) = rx.recv().await else {
            panic!("expected state_changed");
        };
        assert_eq!(snapshot.status, ConnectionStatus::Connecting);
        assert!(snapshot.messages.is_empty());
    }

    #[tokio::test]
    async fn echo_scenario() {
        let service = make_service();
        let id = service.create_session().await.session_id;
        let _ = service.update_server_url(id, spawn_echo_server().await).await;

        let Ok(connection_id) = service.connect(id).await else {
            panic!("connect failed");
        };
        assert!(service.registry().contains(connection_id));

        let _ = service.update_message_buffer(id, "hello".to_string()).await;
        let Ok(outcome) = service.submit_message(id).await else {
            panic!("submit failed");
        };
        assert!(outcome.is_delivered());

        wait_for_messages(&service, id, 2).await;
        let Ok(snapshot) = service.snapshot(id).await else {
            panic!("snapshot failed");
        };
        assert_eq!(
            snapshot.messages,
            [Message::user("hello"), Message::server("hello")]
        );
        assert_eq!(snapshot.message_buffer, "");
    }

    #[tokio::test]
    async fn disconnect_keeps_history_and_deregisters() {
        let service = make_service();
        let id = service.create_session().await.session_id;
        let _ = service.update_server_url(id, spawn_echo_server().await).await;
        let Ok(connection_id) = service.connect(id).await else {
            panic!("connect failed");
        };
        let _ = service.update_message_buffer(id, "ping".to_string()).await;
        let _ = service.submit_message(id).await;
        wait_for_messages(&service, id, 2).await;

        assert!(matches!(service.disconnect(id).await, Ok(true)));
        let wait = async {
            while service.registry().contains(connection_id) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };
        assert!(tokio::time::timeout(Duration::from_secs(5), wait).await.is_ok());

        let Ok(snapshot) = service.snapshot(id).await else {
            panic!("snapshot failed");
        };
        assert!(!snapshot.connected);
        assert_eq!(snapshot.messages.len(), 2);
        assert!(matches!(service.disconnect(id).await, Ok(false)));
    }

    #[tokio::test]
    async fn on_page_load_drops_stale_connection() {
        let service = make_service();
        let id = service.create_session().await.session_id;
        let Ok(session) = service.session(id) else {
            panic!("session missing");
        };
        {
            let mut state = session.lock().await;
            let (attempt, _) = state.begin_connect();
            assert!(state.mark_connected(attempt, ConnectionId::new()));
        }

        let Ok(snapshot) = service.on_page_load(id).await else {
            panic!("load failed");
        };
        assert!(!snapshot.connected);
        assert_eq!(snapshot.status, ConnectionStatus::Idle);
    }

    #[tokio::test]
    async fn end_session_during_handshake_leaves_nothing_live() {
        let service = Arc::new(make_service());
        let id = service.create_session().await.session_id;
        let url = spawn_slow_handshake_server(Duration::from_millis(300)).await;
        let _ = service.update_server_url(id, url).await;

        let connecting = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.connect(id).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        tokio_test::assert_ok!(service.end_session(id).await);

        let Ok(Ok(result)) = tokio::time::timeout(Duration::from_secs(5), connecting).await else {
            panic!("connect did not finish");
        };
        assert!(matches!(result, Err(GatewayError::ConnectSuperseded)));
        assert!(service.registry().is_empty());
        assert_eq!(service.session_count(), 0);
    }

    #[tokio::test]
    async fn end_session_removes_it() {
        let service = make_service();
        let id = service.create_session().await.session_id;
        tokio_test::assert_ok!(service.end_session(id).await);
        tokio_test::assert_err!(service.snapshot(id).await);
        assert_eq!(service.session_count(), 0);
    }
}
