//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//! Connection and send failures stay local to the affected session; they
//! never take the process down.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 3101,
///     "message": "connection error: connection refused",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                    |
/// |-----------|-----------------|--------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request                |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict   |
/// | 3000–3099 | Server          | 500 Internal Server Error      |
/// | 3100–3199 | Upstream        | 502 Bad Gateway                |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Session with the given ID was not found.
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The WebSocket handshake failed (DNS, TLS, refused, timeout, bad URL).
    #[error("connection error: {0}")]
    ConnectionError(String),

    /// A newer connect attempt, or the end of the session, invalidated this
    /// attempt before it completed.
    #[error("connect attempt superseded")]
    ConnectSuperseded,

    /// Writing to the connection failed or the connection is closed.
    #[error("send error: {0}")]
    SendError(String),

    /// A connection id was registered twice.
    #[error("duplicate session connection: {0}")]
    DuplicateSession(uuid::Uuid),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::SessionNotFound(_) => 2001,
            Self::ConnectSuperseded => 2101,
            Self::DuplicateSession(_) => 3001,
            Self::ConnectionError(_) => 3101,
            Self::SendError(_) => 3102,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::ConnectSuperseded => StatusCode::CONFLICT,
            Self::ConnectionError(_) | Self::SendError(_) => StatusCode::BAD_GATEWAY,
            Self::DuplicateSession(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
