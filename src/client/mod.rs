//! Outbound WebSocket client: connection handles and the tasks that move
//! messages between a socket and a session.
//!
//! - [`ConnectionHandle`] wraps one live socket.
//! - [`InboundRelay`] drains a handle into the session log.
//! - [`OutboundDispatcher`] sends user drafts through the live handle.

pub mod dispatcher;
pub mod handle;
pub mod relay;

pub use dispatcher::{DropReason, OutboundDispatcher, SendOutcome};
pub use handle::{CloseReason, ConnectionHandle, Received};
pub use relay::{InboundRelay, RelayExit};
