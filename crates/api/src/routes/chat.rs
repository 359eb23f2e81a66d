//! WebSocket chat relay.
//!
//! Every connected client receives every broadcast frame, including the
//! sender; clients filter by the ids carried in the payload. Frames
//! that are not valid JSON are dropped rather than relayed.

use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}

async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state.chat.clone()))
}

async fn handle_socket(socket: WebSocket, chat: broadcast::Sender<String>) {
    let (mut sink, mut stream) = socket.split();
    let mut rx = chat.subscribe();

    let mut forward = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(payload) => {
                    if sink.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                // Slow consumers skip missed frames and continue.
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "chat subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut inbound = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            if let Message::Text(text) = message {
                if serde_json::from_str::<serde_json::Value>(&text).is_ok() {
                    // A send only fails with zero subscribers, which
                    // cannot happen while this connection is alive.
                    let _ = chat.send(text.to_string());
                } else {
                    tracing::debug!("dropping non-JSON chat frame");
                }
            }
        }
    });

    // Either direction ending tears down the connection.
    tokio::select! {
        _ = &mut forward => inbound.abort(),
        _ = &mut inbound => forward.abort(),
    }
}
