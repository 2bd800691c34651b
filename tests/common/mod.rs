//! Shared helpers for integration tests.

#![allow(dead_code, unused_imports, clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use wscat_gateway::config::SessionSettings;
use wscat_gateway::domain::{SessionId, SessionRegistry, SessionSnapshot};
use wscat_gateway::service::SessionService;

#[path = "../../src/test_support.rs"]
mod servers;

pub(crate) use servers::{
    spawn_echo_server, spawn_scripted_server, spawn_slow_handshake_server, unreachable_url,
};

pub const TIMEOUT: Duration = Duration::from_secs(5);

pub fn make_service() -> Arc<SessionService> {
    let settings = SessionSettings {
        connect_timeout: TIMEOUT,
        send_timeout: TIMEOUT,
        ..SessionSettings::default()
    };
    Arc::new(SessionService::new(Arc::new(SessionRegistry::new()), settings))
}

/// Polls the session until `done` holds or the timeout elapses.
pub async fn wait_until<F>(service: &SessionService, id: SessionId, done: F) -> SessionSnapshot
where
    F: Fn(&SessionSnapshot) -> bool,
{
    let poll = async {
        loop {
            let Ok(snapshot) = service.snapshot(id).await else {
                panic!("session {id} vanished");
            };
            if done(&snapshot) {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    };
    let Ok(snapshot) = tokio::time::timeout(TIMEOUT, poll).await else {
        panic!("condition not reached on session {id}");
    };
    snapshot
}

/// Waits until the registry holds exactly `len` live connections.
pub async fn wait_for_live(service: &SessionService, len: usize) {
    let poll = async {
        while service.registry().len() != len {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    };
    if tokio::time::timeout(TIMEOUT, poll).await.is_err() {
        panic!(
            "expected {len} live connections, found {}",
            service.registry().len()
        );
    }
}
