//! UI WebSocket layer: the presentation layer's live channel to a session.
//!
//! The endpoint at `/ws/sessions/{session_id}` pushes every UI event of the
//! session and accepts the UI's commands (connect, send, field edits,
//! page load).

pub mod connection;
pub mod handler;
pub mod messages;
