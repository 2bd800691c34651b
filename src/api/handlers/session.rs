//! Session handlers: one endpoint per UI event.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::api::dto::{
    DisconnectResponse, FieldUpdateRequest, SessionDto, SessionListResponse, SubmitResponse,
};
use crate::api::extract::SessionPath;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /sessions` — Open a new session.
#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    tag = "Sessions",
    summary = "Open a session",
    description = "Creates an idle session targeting the default server URL.",
    responses(
        (status = 201, description = "Session created", body = SessionDto),
    )
)]
pub async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.session_service.create_session().await;
    (StatusCode::CREATED, Json(SessionDto::from(snapshot)))
}

/// `GET /sessions` — List open sessions.
#[utoipa::path(
    get,
    path = "/api/v1/sessions",
    tag = "Sessions",
    summary = "List sessions",
    responses(
        (status = 200, description = "Open sessions", body = SessionListResponse),
    )
)]
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let data: Vec<SessionDto> = state
        .session_service
        .list_sessions()
        .await
        .into_iter()
        .map(SessionDto::from)
        .collect();
    let total = data.len();
    Json(SessionListResponse { data, total })
}

/// `GET /sessions/{session_id}` — Current session state.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for a malformed id and
/// [`GatewayError::SessionNotFound`] for an unknown session.
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{session_id}",
    tag = "Sessions",
    summary = "Get session state",
    params(("session_id" = String, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Session state", body = SessionDto),
        (status = 400, description = "Malformed session id", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
    )
)]
pub async fn get_session(
    State(state): State<AppState>,
    SessionPath(session_id): SessionPath,
) -> Result<impl IntoResponse, GatewayError> {
    let snapshot = state.session_service.snapshot(session_id).await?;
    Ok(Json(SessionDto::from(snapshot)))
}

/// `DELETE /sessions/{session_id}` — End a session.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for a malformed id and
/// [`GatewayError::SessionNotFound`] for an unknown session.
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{session_id}",
    tag = "Sessions",
    summary = "End a session",
    description = "Closes the session's live connection and forgets the session.",
    params(("session_id" = String, Path, description = "Session identifier")),
    responses(
        (status = 204, description = "Session ended"),
        (status = 400, description = "Malformed session id", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
    )
)]
pub async fn end_session(
    State(state): State<AppState>,
    SessionPath(session_id): SessionPath,
) -> Result<impl IntoResponse, GatewayError> {
    state.session_service.end_session(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /sessions/{session_id}/load` — Page load.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for a malformed id and
/// [`GatewayError::SessionNotFound`] for an unknown session.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{session_id}/load",
    tag = "Sessions",
    summary = "Page load",
    description = "Re-derives `connected` from the live connection table and returns the state.",
    params(("session_id" = String, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Session state", body = SessionDto),
        (status = 400, description = "Malformed session id", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
    )
)]
pub async fn load_session(
    State(state): State<AppState>,
    SessionPath(session_id): SessionPath,
) -> Result<impl IntoResponse, GatewayError> {
    let snapshot = state.session_service.on_page_load(session_id).await?;
    Ok(Json(SessionDto::from(snapshot)))
}

/// `PUT /sessions/{session_id}/server-url` — Edit the server URL.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for a malformed id and
/// [`GatewayError::SessionNotFound`] for an unknown session.
#[utoipa::path(
    put,
    path = "/api/v1/sessions/{session_id}/server-url",
    tag = "Sessions",
    summary = "Set server URL",
    params(("session_id" = String, Path, description = "Session identifier")),
    request_body = FieldUpdateRequest,
    responses(
        (status = 200, description = "Session state", body = SessionDto),
        (status = 400, description = "Malformed session id", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
    )
)]
pub async fn update_server_url(
    State(state): State<AppState>,
    SessionPath(session_id): SessionPath,
    Json(req): Json<FieldUpdateRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let snapshot = state
        .session_service
        .update_server_url(session_id, req.value)
        .await?;
    Ok(Json(SessionDto::from(snapshot)))
}

/// `PUT /sessions/{session_id}/message-buffer` — Edit the draft.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for a malformed id and
/// [`GatewayError::SessionNotFound`] for an unknown session.
#[utoipa::path(
    put,
    path = "/api/v1/sessions/{session_id}/message-buffer",
    tag = "Sessions",
    summary = "Set message draft",
    params(("session_id" = String, Path, description = "Session identifier")),
    request_body = FieldUpdateRequest,
    responses(
        (status = 200, description = "Session state", body = SessionDto),
        (status = 400, description = "Malformed session id", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
    )
)]
pub async fn update_message_buffer(
    State(state): State<AppState>,
    SessionPath(session_id): SessionPath,
    Json(req): Json<FieldUpdateRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let snapshot = state
        .session_service
        .update_message_buffer(session_id, req.value)
        .await?;
    Ok(Json(SessionDto::from(snapshot)))
}

/// `POST /sessions/{session_id}/connect` — Connect to the server URL.
///
/// # Errors
///
/// Returns [`GatewayError::SessionNotFound`] for an unknown session,
/// [`GatewayError::ConnectionError`] if the handshake fails and
/// [`GatewayError::ConnectSuperseded`] if a newer connect replaced it.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{session_id}/connect",
    tag = "Sessions",
    summary = "Connect",
    description = "Clears the message log, opens a WebSocket to the session's server URL and starts relaying inbound text frames.",
    params(("session_id" = String, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Connected", body = SessionDto),
        (status = 400, description = "Malformed session id", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "Superseded by a newer connect", body = ErrorResponse),
        (status = 502, description = "Handshake failed", body = ErrorResponse),
    )
)]
pub async fn connect(
    State(state): State<AppState>,
    SessionPath(session_id): SessionPath,
) -> Result<impl IntoResponse, GatewayError> {
    state.session_service.connect(session_id).await?;
    let snapshot = state.session_service.snapshot(session_id).await?;
    Ok(Json(SessionDto::from(snapshot)))
}

/// `POST /sessions/{session_id}/messages` — Submit the draft.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for a malformed id and
/// [`GatewayError::SessionNotFound`] for an unknown session.
/// Delivery failures are reported in the body, not as errors.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{session_id}/messages",
    tag = "Sessions",
    summary = "Submit message",
    description = "Moves the draft into the log as a user message and sends it over the live connection. Undeliverable sends are dropped silently.",
    params(("session_id" = String, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Submitted", body = SubmitResponse),
        (status = 400, description = "Malformed session id", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
    )
)]
pub async fn submit_message(
    State(state): State<AppState>,
    SessionPath(session_id): SessionPath,
) -> Result<impl IntoResponse, GatewayError> {
    let outcome = state.session_service.submit_message(session_id).await?;
    let snapshot = state.session_service.snapshot(session_id).await?;
    Ok(Json(SubmitResponse::new(outcome, SessionDto::from(snapshot))))
}

/// `POST /sessions/{session_id}/disconnect` — Close the live connection.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for a malformed id and
/// [`GatewayError::SessionNotFound`] for an unknown session.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{session_id}/disconnect",
    tag = "Sessions",
    summary = "Disconnect",
    params(("session_id" = String, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Close requested", body = DisconnectResponse),
        (status = 400, description = "Malformed session id", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
    )
)]
pub async fn disconnect(
    State(state): State<AppState>,
    SessionPath(session_id): SessionPath,
) -> Result<impl IntoResponse, GatewayError> {
    let closed = state.session_service.disconnect(session_id).await?;
    Ok(Json(DisconnectResponse { closed }))
}

/// Session routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session).get(list_sessions))
        .route("/sessions/{session_id}", get(get_session).delete(end_session))
        .route("/sessions/{session_id}/load", post(load_session))
        .route("/sessions/{session_id}/server-url", put(update_server_url))
        .route(
            "/sessions/{session_id}/message-buffer",
            put(update_message_buffer),
        )
        .route("/sessions/{session_id}/connect", post(connect))
        .route("/sessions/{session_id}/messages", post(submit_message))
        .route("/sessions/{session_id}/disconnect", post(disconnect))
}
