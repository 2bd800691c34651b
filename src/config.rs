//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::time::Duration;

/// Server URL a new session targets until the user edits it.
pub const DEFAULT_SERVER_URL: &str = "wss://websocket-echo.com";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Initial server URL of new sessions.
    pub default_server_url: String,

    /// Seconds allowed for the outbound WebSocket handshake.
    pub connect_timeout_secs: u64,

    /// Seconds allowed for a single outbound send.
    pub send_timeout_secs: u64,

    /// Capacity of each session's UI event broadcast channel.
    pub ui_event_capacity: usize,

    /// Log output format.
    pub log_format: LogFormat,
}

/// Per-session knobs handed to [`crate::service::SessionService`].
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Initial server URL of new sessions.
    pub default_server_url: String,
    /// Bound on the outbound handshake.
    pub connect_timeout: Duration,
    /// Bound on a single outbound send.
    pub send_timeout: Duration,
    /// Capacity of each session's UI event channel.
    pub ui_event_capacity: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            default_server_url: DEFAULT_SERVER_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            send_timeout: Duration::from_secs(5),
            ui_event_capacity: 1024,
        }
    }
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()?;

        let default_server_url = std::env::var("DEFAULT_SERVER_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

        let connect_timeout_secs = parse_env("CONNECT_TIMEOUT_SECS", 10);
        let send_timeout_secs = parse_env("SEND_TIMEOUT_SECS", 5);
        let ui_event_capacity = parse_env("UI_EVENT_CAPACITY", 1024);
        let log_format = parse_log_format(std::env::var("LOG_FORMAT").ok().as_deref());

        Ok(Self {
            listen_addr,
            default_server_url,
            connect_timeout_secs,
            send_timeout_secs,
            ui_event_capacity,
            log_format,
        })
    }

    /// Derives the per-session settings.
    #[must_use]
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            default_server_url: self.default_server_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs.max(1)),
            send_timeout: Duration::from_secs(self.send_timeout_secs.max(1)),
            ui_event_capacity: self.ui_event_capacity.max(1),
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Accepts `"json"` (case-insensitive); anything else is plain text.
fn parse_log_format(value: Option<&str>) -> LogFormat {
    match value {
        Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
        _ => LogFormat::Text,
    }
}
