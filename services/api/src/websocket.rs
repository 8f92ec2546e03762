//! WebSocket endpoint for live bet updates

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, info};

use crate::{
    broadcaster::{Broadcaster, Subscription},
    state::AppState,
};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let broadcaster = state.broadcaster.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, broadcaster))
}

async fn handle_socket(socket: WebSocket, broadcaster: Arc<Broadcaster>) {
    let Subscription { id, mut receiver } = broadcaster.subscribe();
    let (mut sender, mut inbound) = socket.split();

    info!("WebSocket connected: {}", id);

    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = receiver.recv().await {
            if sender.send(Message::Binary(frame.to_vec())).await.is_err() {
                break;
            }
        }
    });

    // Clients only listen; inbound traffic matters for detecting close.
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = inbound.next().await {
            match msg {
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(other) => debug!("Ignoring client message on {}: {:?}", id, other),
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    broadcaster.unsubscribe(&id);
    info!("WebSocket disconnected: {}", id);
}
