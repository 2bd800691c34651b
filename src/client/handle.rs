//! One live outbound WebSocket connection.
//!
//! [`ConnectionHandle`] owns the socket, split into a write half used by the
//! outbound dispatcher and a read half drained by the inbound relay. Both
//! halves sit behind their own async mutex so a pending read never blocks a
//! send.

use std::fmt;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, watch};
use tokio_tungstenite::tungstenite::Message as Frame;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::domain::ConnectionId;
use crate::error::GatewayError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Outcome of waiting for the next inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    /// A text frame payload.
    Text(String),
    /// The connection is over; no further frames will arrive.
    Closed(CloseReason),
}

/// Why a connection ended. Only used for logging; every reason ends the
/// relay the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// [`ConnectionHandle::close`] was called on this side.
    Local,
    /// The server sent a close frame or the stream ended.
    Remote,
    /// The read failed.
    Error(String),
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Remote => f.write_str("remote"),
            Self::Error(reason) => write!(f, "error: {reason}"),
        }
    }
}

/// Wrapper around one open WebSocket client connection.
pub struct ConnectionHandle {
    id: ConnectionId,
    url: String,
    sink: Mutex<SplitSink<WsStream, Frame>>,
    stream: Mutex<SplitStream<WsStream>>,
    closed: watch::Sender<bool>,
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl ConnectionHandle {
    /// Performs the WebSocket client handshake against `url`.
    ///
    /// Both `ws://` and `wss://` URLs are accepted; no sub-protocol is
    /// requested.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConnectionError`] if the URL is invalid, the
    /// host cannot be resolved or reached, the TLS or WebSocket handshake
    /// fails, or the handshake does not finish within `connect_timeout`.
    pub async fn open(
        id: ConnectionId,
        url: &str,
        connect_timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let connect = tokio_tungstenite::connect_async(url);
        let (socket, _response) = tokio::time::timeout(connect_timeout, connect)
            .await
            .map_err(|_| {
                GatewayError::ConnectionError(format!(
                    "handshake with {url} timed out after {}s",
                    connect_timeout.as_secs()
                ))
            })?
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;

        let (sink, stream) = socket.split();
        let (closed, _) = watch::channel(false);
        tracing::debug!(%id, url, "websocket handshake complete");

        Ok(Self {
            id,
            url: url.to_string(),
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            closed,
        })
    }

    /// Returns the connection identifier.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the URL this connection was opened against.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns `true` once [`ConnectionHandle::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Waits for the next text frame.
    ///
    /// Binary, ping, pong and raw frames are skipped. Returns
    /// [`Received::Closed`] when the server closes, the read fails, or this
    /// handle is closed locally while waiting.
    pub async fn receive_next(&self) -> Received {
        let mut closed = self.closed.subscribe();
        if *closed.borrow_and_update() {
            return Received::Closed(CloseReason::Local);
        }
        let mut stream = self.stream.lock().await;

        loop {
            tokio::select! {
                _ = closed.wait_for(|closed| *closed) => {
                    return Received::Closed(CloseReason::Local);
                }
                frame = stream.next() => match frame {
                    Some(Ok(Frame::Text(text))) => {
                        return Received::Text(text.as_str().to_owned());
                    }
                    Some(Ok(Frame::Binary(bytes))) => {
                        tracing::trace!(id = %self.id, len = bytes.len(), "ignoring binary frame");
                    }
                    Some(Ok(Frame::Close(_))) | None => {
                        return Received::Closed(CloseReason::Remote);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Received::Closed(CloseReason::Error(e.to_string())),
                },
            }
        }
    }

    /// Sends `text` as a single text frame.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SendError`] if the handle is closed or the
    /// write fails.
    pub async fn send(&self, text: &str) -> Result<(), GatewayError> {
        if self.is_closed() {
            return Err(GatewayError::SendError(format!(
                "connection {} is closed",
                self.id
            )));
        }
        let mut sink = self.sink.lock().await;
        sink.send(Frame::text(text))
            .await
            .map_err(|e| GatewayError::SendError(e.to_string()))
    }

    /// Closes the connection. Idempotent.
    ///
    /// Wakes a pending [`ConnectionHandle::receive_next`] and sends a close
    /// frame on a best-effort basis.
    pub async fn close(&self) {
        if self.closed.send_replace(true) {
            return;
        }
        tracing::debug!(id = %self.id, "closing websocket");
        let mut sink = self.sink.lock().await;
        if let Err(e) = sink.close().await {
            tracing::debug!(id = %self.id, error = %e, "close frame not delivered");
        }
    }
}
