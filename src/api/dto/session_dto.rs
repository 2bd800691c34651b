//! Session DTOs for the REST surface.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::client::SendOutcome;
use crate::domain::{Message, Role, SessionSnapshot};

/// One message log entry.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageDto {
    /// `"user"` or `"server"`.
    #[schema(example = "user")]
    pub role: String,
    /// Message text.
    pub text: String,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        let role = match message.role() {
            Role::User => "user",
            Role::Server => "server",
        };
        Self {
            role: role.to_string(),
            text: message.text().to_string(),
        }
    }
}

/// Observable session state.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionDto {
    /// Session identifier.
    pub session_id: uuid::Uuid,
    /// Target WebSocket server URL.
    pub server_url: String,
    /// Pending outbound draft.
    pub message_buffer: String,
    /// Message log in append order.
    pub messages: Vec<MessageDto>,
    /// `true` while a live connection is registered.
    pub connected: bool,
    /// `"idle"`, `"connecting"` or `"connected"`.
    #[schema(example = "connected")]
    pub status: String,
}

impl From<SessionSnapshot> for SessionDto {
    fn from(snapshot: SessionSnapshot) -> Self {
        Self {
            session_id: *snapshot.session_id.as_uuid(),
            server_url: snapshot.server_url,
            message_buffer: snapshot.message_buffer,
            messages: snapshot.messages.iter().map(MessageDto::from).collect(),
            connected: snapshot.connected,
            status: snapshot.status.as_str().to_string(),
        }
    }
}

/// Response body for `GET /sessions`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionListResponse {
    /// Sessions, oldest first.
    pub data: Vec<SessionDto>,
    /// Number of sessions.
    pub total: usize,
}

/// Request body for the field-update endpoints.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FieldUpdateRequest {
    /// New field value.
    pub value: String,
}

/// Response body for `POST /sessions/{id}/messages`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitResponse {
    /// Whether the text frame reached the socket.
    pub delivered: bool,
    /// Why delivery was skipped, when it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "not_connected")]
    pub drop_reason: Option<String>,
    /// Session state after the submit.
    pub session: SessionDto,
}

impl SubmitResponse {
    /// Builds the response from a dispatcher outcome.
    #[must_use]
    pub fn new(outcome: SendOutcome, session: SessionDto) -> Self {
        let drop_reason = match outcome {
            SendOutcome::Delivered => None,
            SendOutcome::Dropped(reason) => Some(reason.to_string()),
        };
        Self {
            delivered: outcome.is_delivered(),
            drop_reason,
            session,
        }
    }
}

/// Response body for `POST /sessions/{id}/disconnect`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DisconnectResponse {
    /// Whether a live connection was closed.
    pub closed: bool,
}
