//! HTTP and WebSocket handlers

use crate::server::RelayState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::{StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use feed_common::{AppError, ErrorResponse};
use feed_core::{InviteMap, Message as FeedMessage};
use futures_util::{SinkExt, StreamExt};

/// Guild name to invite URL
pub async fn invites_handler(State(state): State<RelayState>) -> Json<InviteMap> {
    Json(state.invites().clone())
}

/// Recent messages, oldest first
pub async fn recents_handler(State(state): State<RelayState>) -> Json<Vec<FeedMessage>> {
    Json(state.hub().recents())
}

/// Live subscription; one JSON message per text frame
pub async fn subscribe_handler(
    State(state): State<RelayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(state, socket))
}

/// Unknown routes
pub async fn fallback_handler(uri: Uri) -> impl IntoResponse {
    let error = AppError::not_found(uri.path());
    let status = StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::NOT_FOUND);
    (status, Json(ErrorResponse::from(error)))
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Forward hub payloads to an upgraded WebSocket until either side closes
async fn handle_socket(state: RelayState, socket: WebSocket) {
    let (id, mut rx) = state.hub().subscribe();
    tracing::info!(subscriber = %id, "Subscriber connected");

    let (mut ws_sink, mut ws_stream) = socket.split();

    // Spawn task to send queued messages to the WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if ws_sink.send(Message::Text(payload.to_string())).await.is_err() {
                tracing::debug!(subscriber = %id, "Failed to send message to WebSocket");
                break;
            }
        }
        let _ = ws_sink.close().await;
    });

    // Spawn task to drain client frames; the relay expects none
    let recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_stream.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::debug!(subscriber = %id, "Client closed connection");
                    break;
                }
                Ok(Message::Text(_) | Message::Binary(_)) => {
                    tracing::trace!(subscriber = %id, "Ignoring client frame");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(subscriber = %id, error = %e, "WebSocket error");
                    break;
                }
            }
        }
    });

    // Wait for either side to finish
    tokio::select! {
        _ = send_task => {
            tracing::debug!(subscriber = %id, "Send task ended");
        }
        _ = recv_task => {
            tracing::debug!(subscriber = %id, "Receive task ended");
        }
    }

    state.hub().unsubscribe(&id);
    tracing::info!(subscriber = %id, "Subscriber disconnected");
}
