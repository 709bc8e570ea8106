use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn};

use voicegate_protocol::{ClientMessage, ServerEvent};

use crate::app::AppState;

/// Axum handler — upgrades HTTP to WebSocket at `GET /ws`.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_connection(socket, state))
}

/// Per-connection task. Treats the socket purely as a sink for the
/// client event protocol (spec §6): one `ClientMessage` in, an ordered
/// `ServerEvent` stream out, per utterance. Dropping the connection mid
/// turn drops the turn's event stream, which tears down its producers
/// (`voicegate_orchestrator::TurnStream`'s `Drop` impl).
async fn handle_connection(socket: WebSocket, state: Arc<AppState>) {
    let conn_id = uuid_like_id();
    info!(conn_id = %conn_id, "new WS connection");

    let (mut tx, mut rx) = socket.split();

    while let Some(msg) = rx.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(err) => {
                warn!(conn_id = %conn_id, %err, "WS read error");
                break;
            }
        };

        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => continue,
        };

        let request: ClientMessage = match serde_json::from_str(&text) {
            Ok(req) => req,
            Err(err) => {
                warn!(conn_id = %conn_id, %err, "malformed client frame, ignoring");
                continue;
            }
        };

        match state.turns.process_message(&request.session_id, &request.text).await {
            Ok(mut events) => {
                while let Some(event) = events.next().await {
                    let terminal = event.is_terminal();
                    if send_json(&mut tx, &event).await.is_err() {
                        break;
                    }
                    if terminal {
                        break;
                    }
                }
            }
            Err(err) => {
                let _ = send_json(&mut tx, &ServerEvent::error(err.to_string())).await;
            }
        }
    }

    info!(conn_id = %conn_id, "WS connection closed");
}

async fn send_json(
    tx: &mut futures_util::stream::SplitSink<WebSocket, Message>,
    payload: &ServerEvent,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(payload).unwrap_or_default();
    tx.send(Message::Text(json.into())).await
}

/// Lightweight connection id for log correlation. A real deployment might
/// prefer `uuid::Uuid::new_v4`; this binary keeps the gateway's own
/// dependency footprint small since `uuid` isn't otherwise needed here.
fn uuid_like_id() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
