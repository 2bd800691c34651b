//! Domain layer: session state, identifiers, registry and UI events.
//!
//! This module holds the per-session state machine, the immutable message
//! type, the process-wide registry of live connections and the event bus
//! that notifies the presentation layer.

pub mod connection_id;
pub mod event_bus;
pub mod message;
pub mod session;
pub mod session_id;
pub mod session_registry;
pub mod session_state;
pub mod ui_event;

pub use connection_id::ConnectionId;
pub use event_bus::UiEventBus;
pub use message::{Message, Role};
pub use session::Session;
pub use session_id::SessionId;
pub use session_registry::SessionRegistry;
pub use session_state::{ConnectAttempt, ConnectionStatus, SessionSnapshot, SessionState};
pub use ui_event::UiEvent;
