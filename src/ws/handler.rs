//! Axum WebSocket upgrade handler for the UI channel.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::api::extract::SessionPath;
use crate::app_state::AppState;
use crate::error::GatewayError;

/// `GET /ws/sessions/{session_id}` — Upgrade to the session's UI channel.
///
/// # Errors
///
/// Returns [`GatewayError::SessionNotFound`] before upgrading if the
/// session does not exist.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    SessionPath(session_id): SessionPath,
) -> Result<impl IntoResponse, GatewayError> {
    let session = state.session_service.session(session_id)?;
    let service = Arc::clone(&state.session_service);

    Ok(ws.on_upgrade(move |socket| run_connection(socket, session, service)))
}
