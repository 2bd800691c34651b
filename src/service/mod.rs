//! Service layer: session orchestration.
//!
//! [`SessionService`] maps UI events onto session transitions, opens
//! connections, and starts the relay for each one.

pub mod session_service;

pub use session_service::SessionService;
