//! `/ws/sync`: the push channel for manifest updates.
//!
//! Outbound frames flow through the subscriber's bounded outbox, so a
//! stalled client lags (drop-oldest) instead of blocking the hub. The
//! socket never closes on orchestration errors; they surface as `error`
//! frames.

use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use sensoria_sync::PushFrame;
use serde_json::Value;

pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_sync_ws(socket, state))
}

async fn handle_sync_ws(socket: WebSocket, state: AppState) {
    let hub = state.sync.hub().clone();
    let (subscriber_id, outbox) = hub.subscribe().await;

    match state.sync.current_manifest().await {
        Ok(manifest) => {
            outbox
                .push(PushFrame::Welcome {
                    etag: manifest.etag,
                    file_count: manifest.file_count,
                })
                .await;
        }
        Err(e) => {
            outbox
                .push(PushFrame::Error {
                    kind: e.kind.as_str().to_string(),
                    message: e.message.clone(),
                })
                .await;
        }
    }

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Writer: drain the outbox until it closes or the socket drops.
    let writer_outbox = outbox.clone();
    let writer = tokio::spawn(async move {
        while let Some(frame) = writer_outbox.pop().await {
            let json = serde_json::to_string(&frame).unwrap_or_default();
            if ws_tx.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Reader: client pings and malformed input.
    while let Some(Ok(msg)) = ws_rx.next().await {
        match msg {
            Message::Text(text) => {
                let frame: Value = match serde_json::from_str(&text) {
                    Ok(v) => v,
                    Err(e) => {
                        outbox
                            .push(PushFrame::Error {
                                kind: "invalid_argument".to_string(),
                                message: format!("invalid JSON frame: {e}"),
                            })
                            .await;
                        continue;
                    }
                };
                match frame.get("type").and_then(Value::as_str) {
                    Some("ping") => outbox.push(PushFrame::Pong).await,
                    other => {
                        outbox
                            .push(PushFrame::Error {
                                kind: "invalid_argument".to_string(),
                                message: format!("unsupported frame type: {other:?}"),
                            })
                            .await;
                    }
                }
            }
            Message::Close(_) => break,
            // Protocol-level pings are answered by axum itself.
            _ => {}
        }
    }

    // Disconnect: reclaim the subscriber and stop the writer.
    hub.unsubscribe(subscriber_id).await;
    let _ = writer.await;
}
