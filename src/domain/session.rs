//! A UI session: exclusive state plus its notification bus.

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, MutexGuard, broadcast};

use super::{SessionId, SessionSnapshot, SessionState, UiEvent, UiEventBus};

/// One logical UI session.
///
/// All [`SessionState`] mutations go through [`Session::lock`], which
/// serializes the inbound relay, the outbound dispatcher and UI edits for
/// this session. Unrelated sessions never contend on this lock.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    state: Mutex<SessionState>,
    events: UiEventBus,
    created_at: DateTime<Utc>,
}

impl Session {
    /// Creates an idle session targeting `server_url`.
    #[must_use]
    pub fn new(id: SessionId, server_url: impl Into<String>, event_capacity: usize) -> Self {
        Self {
            id,
            state: Mutex::new(SessionState::new(server_url)),
            events: UiEventBus::new(event_capacity),
            created_at: Utc::now(),
        }
    }

    /// Returns the session identifier.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Acquires exclusive access to the session state.
    pub async fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().await
    }

    /// Takes a snapshot under the session lock.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.lock().await.snapshot(self.id)
    }

    /// Subscribes to this session's UI events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.events.subscribe()
    }

    /// Returns `true` while at least one UI channel is subscribed.
    #[must_use]
    pub fn has_listeners(&self) -> bool {
        self.events.receiver_count() > 0
    }

    /// Publishes a re-render notification for `state`.
    ///
    /// Callers pass the guard they already hold so the snapshot matches the
    /// mutation that triggered it. No snapshot is built while nobody listens.
    pub fn notify_changed(&self, state: &SessionState) {
        if !self.has_listeners() {
            return;
        }
        self.events.publish(UiEvent::state_changed(state.snapshot(self.id)));
    }

    /// Publishes the notification pair for a message append: a re-render
    /// followed by a scroll to the newest entry.
    pub fn notify_appended(&self, state: &SessionState) {
        if !self.has_listeners() {
            return;
        }
        self.notify_changed(state);
        self.events
            .publish(UiEvent::scroll_to_latest(self.id, state.messages().len()));
    }
}
