//! # wscat-gateway
//!
//! Per-session WebSocket client gateway.
//!
//! Each UI session owns a small state machine (server URL, draft, message
//! log, connection status). Connecting a session opens an outbound
//! WebSocket to its server URL, a relay task appends every inbound text
//! frame to the session log, and submitted drafts are sent back over the
//! same connection. The presentation layer drives sessions over REST or a
//! per-session UI WebSocket and re-renders from the events it receives.
//!
//! ## Architecture
//!
//! ```text
//! Presentation layer (HTTP, UI WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── UI WS Handler (ws/)
//!     │
//!     ├── SessionService (service/)
//!     │
//!     ├── Session + SessionState + UiEventBus (domain/)
//!     ├── SessionRegistry (domain/)
//!     │
//!     ├── OutboundDispatcher ─┐
//!     ├── InboundRelay ───────┤ (client/)
//!     └── ConnectionHandle ◀──┘
//!             │
//!         WebSocket server
//! ```

pub mod api;
pub mod app_state;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod ws;

#[cfg(test)]
#[allow(clippy::panic)]
mod test_support;
