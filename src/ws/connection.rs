//! UI WebSocket connection loop.
//!
//! Handles the read/write loop for a single UI channel: dispatches incoming
//! commands to the [`SessionService`] and forwards the session's
//! [`UiEvent`]s.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use crate::client::SendOutcome;
use crate::domain::{Session, SessionId, UiEvent};
use crate::error::GatewayError;
use crate::service::SessionService;

/// Runs the read/write loop for a single UI WebSocket.
///
/// - Sends the current snapshot first so the UI can render immediately.
/// - Reads commands from the UI and dispatches them.
/// - Forwards every event of the session's bus; a lagging channel is
///   resynchronized with a fresh snapshot.
pub async fn run_connection(
    socket: WebSocket,
    session: Arc<Session>,
    service: Arc<SessionService>,
) {
    let session_id = session.id();
    let mut event_rx = session.subscribe();
    let (mut ws_tx, mut ws_rx) = socket.split();

    let initial = event_envelope(&UiEvent::state_changed(session.snapshot().await));
    if ws_tx.send(Message::text(initial)).await.is_err() {
        return;
    }
    tracing::debug!(%session_id, "ui channel opened");

    loop {
        tokio::select! {
            // Incoming command from the UI
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, session_id, &service).await;
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    _ => {}
                }
            }
            // Event from the session bus
            event = event_rx.recv() => {
                let json = match event {
                    Ok(ui_event) => event_envelope(&ui_event),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(%session_id, lagged = n, "ui channel lagged, resyncing");
                        event_envelope(&UiEvent::state_changed(session.snapshot().await))
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                if ws_tx.send(Message::text(json)).await.is_err() {
                    break;
                }
            }
        }
    }

    tracing::debug!(%session_id, "ui channel closed");
}

/// Wraps a UI event in an `event` envelope.
fn event_envelope(event: &UiEvent) -> String {
    let msg = WsMessage::new(
        uuid::Uuid::new_v4().to_string(),
        WsMessageType::Event,
        serde_json::to_value(event).unwrap_or_default(),
    );
    serde_json::to_string(&msg).unwrap_or_default()
}

/// Handles a text message from the UI, returning an optional JSON response.
async fn handle_text_message(
    text: &str,
    session_id: SessionId,
    service: &Arc<SessionService>,
) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return serde_json::to_string(&WsMessage::error("", 400, "malformed JSON")).ok();
    };
    let WsMessage { id, payload, .. } = msg;

    let Ok(command) = serde_json::from_value::<WsCommand>(payload) else {
        return serde_json::to_string(&WsMessage::error(id, 404, "unknown command")).ok();
    };

    let response = match dispatch_command(command, session_id, service).await {
        Ok(payload) => WsMessage::new(id, WsMessageType::Response, payload),
        Err(e) => WsMessage::error(id, e.error_code(), &e.to_string()),
    };
    serde_json::to_string(&response).ok()
}

/// Maps one UI command onto the matching service operation.
async fn dispatch_command(
    command: WsCommand,
    session_id: SessionId,
    service: &Arc<SessionService>,
) -> Result<serde_json::Value, GatewayError> {
    match command {
        WsCommand::Connect => {
            // The handshake may take a while; its progress reaches the UI as
            // state_changed events.
            let service = Arc::clone(service);
            tokio::spawn(async move {
                if let Err(e) = service.connect(session_id).await {
                    tracing::debug!(%session_id, error = %e, "connect command failed");
                }
            });
            Ok(serde_json::json!({ "accepted": true }))
        }
        WsCommand::SendMessage => {
            let outcome = service.submit_message(session_id).await?;
            let drop_reason = match outcome {
                SendOutcome::Delivered => None,
                SendOutcome::Dropped(reason) => Some(reason),
            };
            Ok(serde_json::json!({
                "delivered": outcome.is_delivered(),
                "drop_reason": drop_reason,
            }))
        }
        WsCommand::SetServerUrl { value } => {
            service.update_server_url(session_id, value).await?;
            Ok(serde_json::json!({ "ok": true }))
        }
        WsCommand::SetMessageBuffer { value } => {
            service.update_message_buffer(session_id, value).await?;
            Ok(serde_json::json!({ "ok": true }))
        }
        WsCommand::Load => {
            let snapshot = service.on_page_load(session_id).await?;
            Ok(serde_json::to_value(&snapshot).unwrap_or_default())
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::config::SessionSettings;
    use crate::domain::SessionRegistry;

    fn make_service() -> Arc<SessionService> {
        Arc::new(SessionService::new(
            Arc::new(SessionRegistry::new()),
            SessionSettings::default(),
        ))
    }

    fn parse(json: Option<String>) -> WsMessage {
        let Some(json) = json else {
            panic!("expected a response");
        };
        let Ok(msg) = serde_json::from_str::<WsMessage>(&json) else {
            panic!("response is not an envelope: {json}");
        };
        msg
    }

    fn command(id: &str, payload: serde_json::Value) -> String {
        serde_json::to_string(&WsMessage::new(id, WsMessageType::Command, payload))
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn malformed_json_gets_error() {
        let service = make_service();
        let msg = parse(handle_text_message("{nope", SessionId::new(), &service).await);
        assert_eq!(msg.msg_type, WsMessageType::Error);
        assert_eq!(msg.payload["code"], 400);
    }

    #[tokio::test]
    async fn unknown_command_keeps_request_id() {
        let service = make_service();
        let text = command("req-1", serde_json::json!({ "command": "reboot" }));
        let msg = parse(handle_text_message(&text, SessionId::new(), &service).await);
        assert_eq!(msg.id, "req-1");
        assert_eq!(msg.msg_type, WsMessageType::Error);
    }

    #[tokio::test]
    async fn set_buffer_then_send_while_disconnected() {
        let service = make_service();
        let id = service.create_session().await.session_id;

        let text = command(
            "a",
            serde_json::json!({ "command": "set_message_buffer", "value": "hello" }),
        );
        let msg = parse(handle_text_message(&text, id, &service).await);
        assert_eq!(msg.msg_type, WsMessageType::Response);

        let text = command("b", serde_json::json!({ "command": "send_message" }));
        let msg = parse(handle_text_message(&text, id, &service).await);
        assert_eq!(msg.payload["delivered"], false);
        assert_eq!(msg.payload["drop_reason"], "not_connected");

        let Ok(snapshot) = service.snapshot(id).await else {
            panic!("snapshot failed");
        };
        assert_eq!(snapshot.messages.len(), 1);
        assert_eq!(snapshot.message_buffer, "");
    }

    #[tokio::test]
    async fn missing_session_reports_not_found_code() {
        let service = make_service();
        let text = command("c", serde_json::json!({ "command": "load" }));
        let msg = parse(handle_text_message(&text, SessionId::new(), &service).await);
        assert_eq!(msg.msg_type, WsMessageType::Error);
        assert_eq!(msg.payload["code"], 2001);
    }
}
