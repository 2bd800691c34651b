//! Broadcast channel for UI notifications.
//!
//! [`UiEventBus`] wraps a [`tokio::sync::broadcast`] channel. Each session
//! owns one bus; every UI WebSocket attached to that session subscribes to
//! it.

use tokio::sync::broadcast;

use super::UiEvent;

/// Broadcast bus for one session's [`UiEvent`]s.
///
/// When the ring buffer is full the oldest events are dropped for lagging
/// receivers, which then resynchronize from a fresh snapshot.
#[derive(Debug, Clone)]
pub struct UiEventBus {
    sender: broadcast::Sender<UiEvent>,
}

impl UiEventBus {
    /// Creates a new `UiEventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event. Without
    /// receivers the event is silently dropped.
    pub fn publish(&self, event: UiEvent) -> usize {
        let session_id = event.session_id();
        let event_type = event.event_type_str();
        let receivers = self.sender.send(event).unwrap_or(0);
        tracing::trace!(%session_id, event_type, receivers, "ui event published");
        receivers
    }

    /// Creates a new receiver for all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
