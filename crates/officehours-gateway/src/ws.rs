// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket subscription to a queue.
//!
//! Server -> Client (JSON text frames):
//! ```json
//! {"queueId": 3, "type": "questions", "data": { ...snapshot... }}
//! {"queueId": 3, "type": "queue_meta", "data": { ...queue... }}
//! {"queueId": 3, "type": "chat_sessions", "data": [ ... ]}
//! ```
//!
//! The current snapshot is sent right after the upgrade. Client frames are
//! ignored apart from close.

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};

use officehours_core::{ChangeKind, QueueId};

use crate::auth::Identity;
use crate::error::ApiError;
use crate::hub::Viewer;
use crate::server::GatewayState;

/// GET /v1/queues/{id}/ws
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<GatewayState>,
    identity: Identity,
    Path(queue_id): Path<i64>,
) -> Result<Response, ApiError> {
    let queue_id = QueueId(queue_id);
    state.service.require_queue(queue_id).await?;
    let viewer = Viewer {
        user_id: identity.user_id,
        role: identity.role,
    };
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, queue_id, viewer)))
}

async fn handle_socket(socket: WebSocket, state: GatewayState, queue_id: QueueId, viewer: Viewer) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = state.hub.channel();

    match state.hub.render(queue_id, ChangeKind::Questions, viewer).await {
        Ok(initial) => match serde_json::to_string(&initial) {
            Ok(text) => {
                if ws_sender.send(Message::Text(text.into())).await.is_err() {
                    return;
                }
            }
            Err(e) => warn!(queue_id = %queue_id, error = %e, "initial snapshot serialization failed"),
        },
        Err(e) => warn!(queue_id = %queue_id, error = %e, "initial snapshot unavailable"),
    }

    let subscription = state.hub.subscribe(queue_id, viewer, tx);

    let sender_task = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if ws_sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = ws_receiver.next().await {
        if let Message::Close(_) = msg {
            break;
        }
    }

    debug!(queue_id = %subscription.queue_id(), user_id = %viewer.user_id, "websocket closed");
    drop(subscription);
    sender_task.abort();
}
