//! Outbound dispatcher: user drafts onto the live connection.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::domain::{Session, SessionRegistry};

/// Why a submitted message was not delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// The session has no current connection.
    NotConnected,
    /// The session's connection is no longer in the registry.
    NoLiveHandle,
    /// The write to the socket failed.
    SendFailed,
    /// The write did not complete within the send timeout.
    TimedOut,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotConnected => "not_connected",
            Self::NoLiveHandle => "no_live_handle",
            Self::SendFailed => "send_failed",
            Self::TimedOut => "timed_out",
        })
    }
}

/// Result of one submit. Dropped sends are not errors: the message stays in
/// the log as sent by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The text frame was written to the socket.
    Delivered,
    /// The text was logged but not delivered.
    Dropped(DropReason),
}

impl SendOutcome {
    /// Returns `true` if the frame reached the socket.
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Forwards user submissions to the session's live connection.
#[derive(Debug, Clone)]
pub struct OutboundDispatcher {
    registry: Arc<SessionRegistry>,
    send_timeout: Duration,
}

impl OutboundDispatcher {
    /// Creates a dispatcher resolving handles through `registry`.
    #[must_use]
    pub fn new(registry: Arc<SessionRegistry>, send_timeout: Duration) -> Self {
        Self {
            registry,
            send_timeout,
        }
    }

    /// Submits the session's current draft.
    ///
    /// Takes and clears the draft, appends it as a user message, notifies
    /// the UI, then sends it over the live connection. The session lock is
    /// held throughout so sends leave in submission order and a concurrent
    /// resubmit cannot pick up the same draft.
    pub async fn submit(&self, session: &Session) -> SendOutcome {
        let mut state = session.lock().await;
        let text = state.take_outbound_draft();
        state.append_user_message(text.as_str());
        session.notify_appended(&state);

        let Some(connection_id) = state.connection_id() else {
            tracing::debug!(session_id = %session.id(), "not connected, send dropped");
            return SendOutcome::Dropped(DropReason::NotConnected);
        };
        let session_id = session.id();
        let Some(handle) = self.registry.lookup(connection_id) else {
            tracing::debug!(%session_id, %connection_id, "no live handle, send dropped");
            return SendOutcome::Dropped(DropReason::NoLiveHandle);
        };

        match tokio::time::timeout(self.send_timeout, handle.send(&text)).await {
            Ok(Ok(())) => SendOutcome::Delivered,
            Ok(Err(e)) => {
                tracing::debug!(%session_id, %connection_id, error = %e, "send dropped");
                SendOutcome::Dropped(DropReason::SendFailed)
            }
            Err(_) => {
                tracing::warn!(%session_id, %connection_id, "send timed out");
                SendOutcome::Dropped(DropReason::TimedOut)
            }
        }
    }
}
