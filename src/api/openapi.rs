//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use super::dto::{
    DisconnectResponse, FieldUpdateRequest, HealthResponse, MessageDto, SessionDto,
    SessionListResponse, SubmitResponse,
};
use super::handlers::{session, system};
use crate::error::{ErrorBody, ErrorResponse};

/// Generated OpenAPI specification.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "wscat-gateway",
        description = "Per-session WebSocket client gateway"
    ),
    paths(
        system::health_handler,
        session::create_session,
        session::list_sessions,
        session::get_session,
        session::end_session,
        session::load_session,
        session::update_server_url,
        session::update_message_buffer,
        session::connect,
        session::submit_message,
        session::disconnect,
    ),
    components(schemas(
        HealthResponse,
        MessageDto,
        SessionDto,
        SessionListResponse,
        FieldUpdateRequest,
        SubmitResponse,
        DisconnectResponse,
        ErrorResponse,
        ErrorBody,
    )),
    tags(
        (name = "Sessions", description = "Session lifecycle and messaging"),
        (name = "System", description = "Health and metadata"),
    )
)]
pub struct ApiDoc;
