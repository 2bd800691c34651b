//! Type-safe identifier for one outbound WebSocket connection.
//!
//! [`ConnectionId`] is a newtype wrapper around [`uuid::Uuid`] (v4). A fresh
//! id is minted for every connect attempt, so collisions in the
//! [`super::SessionRegistry`] indicate a programming error.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a live WebSocket connection.
///
/// Used as the key of [`super::SessionRegistry`] and recorded in
/// [`super::SessionState`] while the session owns that connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    /// Creates a new random `ConnectionId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Creates a `ConnectionId` from an existing [`uuid::Uuid`].
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<uuid::Uuid> for ConnectionId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}
