//! Local WebSocket servers for tests.
//!
//! Compiled into the unit tests and, through `#[path]`, into the
//! integration tests under `tests/`.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message as Frame;

async fn bind() -> (TcpListener, String) {
    let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind test listener");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("test listener address");
    };
    (listener, format!("ws://{addr}"))
}

async fn echo(tcp: TcpStream) {
    let Ok(mut ws) = tokio_tungstenite::accept_async(tcp).await else {
        return;
    };
    while let Some(Ok(frame)) = ws.next().await {
        match frame {
            Frame::Text(_) => {
                if ws.send(frame).await.is_err() {
                    break;
                }
            }
            Frame::Close(_) => break,
            _ => {}
        }
    }
}

/// Starts a server that echoes every text frame back to the sender.
pub(crate) async fn spawn_echo_server() -> String {
    let (listener, url) = bind().await;
    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            tokio::spawn(echo(tcp));
        }
    });
    url
}

/// Starts an echo server that holds each accepted TCP connection for
/// `delay` before answering the WebSocket handshake.
pub(crate) async fn spawn_slow_handshake_server(delay: Duration) -> String {
    let (listener, url) = bind().await;
    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                echo(tcp).await;
            });
        }
    });
    url
}

/// Starts a server that sends `frames` to each client, then closes.
pub(crate) async fn spawn_scripted_server(frames: Vec<Frame>) -> String {
    let (listener, url) = bind().await;
    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            let frames = frames.clone();
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(tcp).await else {
                    return;
                };
                for frame in frames {
                    if ws.send(frame).await.is_err() {
                        return;
                    }
                }
                let _ = ws.close(None).await;
                while let Some(Ok(_)) = ws.next().await {}
            });
        }
    });
    url
}

/// Returns a `ws://` URL on a port nothing listens on.
pub(crate) async fn unreachable_url() -> String {
    let (listener, url) = bind().await;
    drop(listener);
    url
}
