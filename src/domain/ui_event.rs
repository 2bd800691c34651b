//! Notifications pushed to the presentation layer.
//!
//! Every session mutation publishes a [`UiEvent`] through the session's
//! [`super::UiEventBus`]. Message appends publish a second event asking the
//! UI to scroll to the newest entry.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{SessionId, SessionSnapshot};

/// DOM anchor the UI scrolls to after an append.
pub const MESSAGES_END_ANCHOR: &str = "messages-end";

/// Event emitted after a session state change.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum UiEvent {
    /// The session state changed; re-render from this snapshot.
    StateChanged {
        /// Full session state after the change.
        snapshot: SessionSnapshot,
        /// Emission timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A message was appended; scroll to the latest entry.
    ScrollToLatest {
        /// Session identifier.
        session_id: SessionId,
        /// Element id to scroll into view.
        anchor: &'static str,
        /// Number of messages in the log after the append.
        message_count: usize,
        /// Emission timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl UiEvent {
    /// Builds a [`UiEvent::StateChanged`] stamped with the current time.
    #[must_use]
    pub fn state_changed(snapshot: SessionSnapshot) -> Self {
        Self::StateChanged {
            snapshot,
            timestamp: Utc::now(),
        }
    }

    /// Builds a [`UiEvent::ScrollToLatest`] stamped with the current time.
    #[must_use]
    pub fn scroll_to_latest(session_id: SessionId, message_count: usize) -> Self {
        Self::ScrollToLatest {
            session_id,
            anchor: MESSAGES_END_ANCHOR,
            message_count,
            timestamp: Utc::now(),
        }
    }

    /// Returns the session this event belongs to.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        match self {
            Self::StateChanged { snapshot, .. } => snapshot.session_id,
            Self::ScrollToLatest { session_id, .. } => *session_id,
        }
    }

    /// Returns the snake_case event type string.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::StateChanged { .. } => "state_changed",
            Self::ScrollToLatest { .. } => "scroll_to_latest",
        }
    }
}
