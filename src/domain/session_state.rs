//! Per-session state machine.
//!
//! [`SessionState`] holds everything the UI renders for one session: the
//! target server URL, the outbound draft, the message log and the
//! connection status. It is plain data; callers serialize access through
//! the owning [`super::Session`]'s mutex.
//!
//! ```text
//! Idle ──begin_connect──▶ Connecting ──mark_connected──▶ Connected
//!  ▲                          │                             │
//!  └──────fail_connect────────┘◀──────mark_disconnected─────┘
//! ```
//!
//! Every connect attempt is tagged with a [`ConnectAttempt`] token and every
//! established connection with its [`ConnectionId`]. Transitions carrying a
//! stale token or id are rejected, so a superseded connection can never
//! write into a newer connection epoch.

use std::mem;

use serde::Serialize;

use super::{ConnectionId, Message, SessionId};

/// Connection lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// No connection and no attempt in flight.
    #[default]
    Idle,
    /// Handshake in progress.
    Connecting,
    /// A live connection is registered for this session.
    Connected,
}

impl ConnectionStatus {
    /// Returns the snake_case status string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

/// Token identifying one connect attempt, issued by
/// [`SessionState::begin_connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectAttempt(u64);

/// Mutable state of one UI session.
#[derive(Debug, Clone)]
pub struct SessionState {
    server_url: String,
    message_buffer: String,
    messages: Vec<Message>,
    status: ConnectionStatus,
    connection_id: Option<ConnectionId>,
    attempt: u64,
}

/// Read-only view of a session handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    /// Session the snapshot was taken from.
    pub session_id: SessionId,
    /// Target WebSocket server URL.
    pub server_url: String,
    /// Pending outbound draft.
    pub message_buffer: String,
    /// Message log in append order.
    pub messages: Vec<Message>,
    /// `true` only while a live connection is registered.
    pub connected: bool,
    /// Detailed lifecycle status.
    pub status: ConnectionStatus,
}

impl SessionState {
    /// Creates an idle session targeting `server_url`.
    #[must_use]
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            message_buffer: String::new(),
            messages: Vec::new(),
            status: ConnectionStatus::Idle,
            connection_id: None,
            attempt: 0,
        }
    }

    /// Returns the target server URL.
    #[must_use]
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Returns the pending outbound draft.
    #[must_use]
    pub fn message_buffer(&self) -> &str {
        &self.message_buffer
    }

    /// Returns the message log in append order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Returns `true` while a live connection is registered.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    /// Returns the id of the connection this session currently owns.
    #[must_use]
    pub const fn connection_id(&self) -> Option<ConnectionId> {
        self.connection_id
    }

    /// Replaces the target server URL.
    pub fn set_server_url(&mut self, value: impl Into<String>) {
        self.server_url = value.into();
    }

    /// Replaces the pending outbound draft.
    pub fn set_message_buffer(&mut self, value: impl Into<String>) {
        self.message_buffer = value.into();
    }

    /// Starts a new connect attempt.
    ///
    /// Clears the message log and any current connection. Returns the token
    /// for this attempt together with the connection it superseded, which
    /// the caller is expected to close.
    pub fn begin_connect(&mut self) -> (ConnectAttempt, Option<ConnectionId>) {
        self.attempt = self.attempt.wrapping_add(1);
        self.messages.clear();
        self.status = ConnectionStatus::Connecting;
        let superseded = self.connection_id.take();
        (ConnectAttempt(self.attempt), superseded)
    }

    /// Records a successful connect. Returns `false` (and changes nothing)
    /// if `attempt` has been superseded by a newer one.
    pub fn mark_connected(&mut self, attempt: ConnectAttempt, id: ConnectionId) -> bool {
        if !self.is_current(attempt) {
            return false;
        }
        self.status = ConnectionStatus::Connected;
        self.connection_id = Some(id);
        true
    }

    /// Records a failed connect. Returns `false` if `attempt` is stale.
    pub fn fail_connect(&mut self, attempt: ConnectAttempt) -> bool {
        if !self.is_current(attempt) {
            return false;
        }
        self.status = ConnectionStatus::Idle;
        self.connection_id = None;
        true
    }

    /// Appends a server message received on connection `id`.
    ///
    /// Returns `false` if the session no longer owns that connection.
    pub fn append_server_message(&mut self, id: ConnectionId, text: impl Into<String>) -> bool {
        if self.connection_id != Some(id) {
            return false;
        }
        self.messages.push(Message::server(text));
        true
    }

    /// Appends a user message.
    pub fn append_user_message(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
    }

    /// Records that connection `id` has closed. The message log is kept.
    ///
    /// Returns `false` if the session no longer owns that connection.
    pub fn mark_disconnected(&mut self, id: ConnectionId) -> bool {
        if self.connection_id != Some(id) {
            return false;
        }
        self.status = ConnectionStatus::Idle;
        self.connection_id = None;
        true
    }

    /// Retires the session.
    ///
    /// Invalidates any connect attempt still in flight, so its later
    /// [`SessionState::mark_connected`] is rejected, and returns the
    /// connection the session owned for the caller to close.
    pub fn end(&mut self) -> Option<ConnectionId> {
        self.attempt = self.attempt.wrapping_add(1);
        self.status = ConnectionStatus::Idle;
        self.connection_id.take()
    }

    /// Returns the pending draft and leaves the buffer empty.
    pub fn take_outbound_draft(&mut self) -> String {
        mem::take(&mut self.message_buffer)
    }

    /// Drops a recorded connection that is no longer live.
    ///
    /// Returns `true` if the state changed.
    pub fn reconcile(&mut self, live: bool) -> bool {
        if live || self.status != ConnectionStatus::Connected {
            return false;
        }
        self.status = ConnectionStatus::Idle;
        self.connection_id = None;
        true
    }

    /// Captures the UI-visible part of the state.
    #[must_use]
    pub fn snapshot(&self, session_id: SessionId) -> SessionSnapshot {
        SessionSnapshot {
            session_id,
            server_url: self.server_url.clone(),
            message_buffer: self.message_buffer.clone(),
            messages: self.messages.clone(),
            connected: self.connected(),
            status: self.status,
        }
    }

    fn is_current(&self, attempt: ConnectAttempt) -> bool {
        attempt.0 == self.attempt && self.status == ConnectionStatus::Connecting
    }
}
