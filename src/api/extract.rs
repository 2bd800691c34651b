//! Request extractors shared by the REST and UI WebSocket handlers.

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;

use crate::domain::SessionId;
use crate::error::GatewayError;

/// `{session_id}` path segment parsed as a [`SessionId`].
///
/// Rejects with [`GatewayError::InvalidRequest`] so a malformed id gets the
/// same JSON error body as every other failure.
#[derive(Debug, Clone, Copy)]
pub struct SessionPath(pub SessionId);

impl<S> FromRequestParts<S> for SessionPath
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| GatewayError::InvalidRequest(rejection.body_text()))?;
        raw.parse()
            .map(Self)
            .map_err(|_| GatewayError::InvalidRequest(format!("malformed session id: {raw}")))
    }
}
