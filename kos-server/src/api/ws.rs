//! Realtime notifications over WebSocket
//!
//! `GET /api/ws?token=<access JWT>`. Browsers cannot set headers on a
//! WebSocket handshake, so the token travels in the query string.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::{Router, routing::get};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use shared::error::AppError;
use tokio::sync::broadcast::error::RecvError;

use crate::auth::{CurrentUser, authenticate};
use crate::state::AppState;

const PING_INTERVAL: Duration = Duration::from_secs(30);

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(handle_ws))
}

#[derive(Deserialize)]
pub struct WsQuery {
    token: String,
}

/// GET /api/ws - authenticate, then upgrade
pub async fn handle_ws(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let user = authenticate(&state.jwt, &query.token)?;
    Ok(ws.on_upgrade(move |socket| handle_connection(socket, state, user)))
}

async fn handle_connection(socket: WebSocket, state: AppState, user: CurrentUser) {
    tracing::info!(user_id = user.id, username = %user.username, "WebSocket connected");

    let (mut sink, mut stream) = socket.split();
    let mut notifications = state.notifier.subscribe(user.id);
    let mut ping = tokio::time::interval(PING_INTERVAL);
    ping.tick().await;

    loop {
        tokio::select! {
            received = notifications.recv() => match received {
                Ok(notification) => {
                    let Ok(json) = serde_json::to_string(&notification) else {
                        continue;
                    };
                    if sink.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(user_id = user.id, skipped, "WebSocket client lagging, resubscribing");
                    notifications = state.notifier.subscribe(user.id);
                }
                Err(RecvError::Closed) => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(Message::Ping(payload))) => {
                    if sink.send(Message::Pong(payload)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(user_id = user.id, error = %e, "WebSocket read error");
                    break;
                }
            },
            _ = ping.tick() => {
                if sink.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
        }
    }

    drop(notifications);
    state.notifier.prune();
    tracing::info!(user_id = user.id, "WebSocket disconnected");
}
