//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, ConnectionIdFactory},
    infrastructure::dto::websocket::ClientEvent,
    ui::{dispatcher::RelayCommand, state::AppState},
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that drains the connection's outbound queue into the socket.
///
/// The queue ends when the dispatcher drops its sender (the connection was
/// evicted), in which case a close frame is sent before the task exits.
fn pusher_loop(
    mut rx: mpsc::Receiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                return;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = ConnectionIdFactory::generate();
    let (tx, rx) = mpsc::channel(state.outbound_queue);

    if state
        .commands
        .send(RelayCommand::Open {
            id: connection_id.clone(),
            sender: tx,
        })
        .await
        .is_err()
    {
        tracing::error!("Dispatcher is gone, refusing connection '{}'", connection_id);
        return;
    }
    tracing::debug!("WebSocket '{}' upgraded", connection_id);

    let (sender, receiver) = socket.split();
    let mut recv_task = tokio::spawn(receive_loop(
        receiver,
        connection_id.clone(),
        state.commands.clone(),
    ));
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    if state
        .commands
        .send(RelayCommand::Close {
            id: connection_id.clone(),
        })
        .await
        .is_err()
    {
        tracing::warn!("Dispatcher is gone, could not close '{}'", connection_id);
    }
}

/// Parses inbound frames and forwards them to the dispatcher.
///
/// Frames that fail to parse are logged and dropped; they never close the
/// connection. A full command queue pauses reading until there is room.
async fn receive_loop(
    mut receiver: futures_util::stream::SplitStream<WebSocket>,
    connection_id: ConnectionId,
    commands: mpsc::Sender<RelayCommand>,
) {
    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!("WebSocket '{}' error: {}", connection_id, e);
                break;
            }
        };

        match msg {
            Message::Text(text) => {
                let event = match serde_json::from_str::<ClientEvent>(text.as_str()) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!(
                            "Dropped malformed frame from '{}': {}",
                            connection_id,
                            e
                        );
                        continue;
                    }
                };
                let command = RelayCommand::Inbound {
                    id: connection_id.clone(),
                    event,
                };
                if commands.send(command).await.is_err() {
                    break;
                }
            }
            Message::Binary(_) => {
                tracing::debug!("Ignored binary frame from '{}'", connection_id);
            }
            Message::Close(_) => {
                tracing::debug!("Client '{}' requested close", connection_id);
                break;
            }
            // Ping/pong is handled automatically by the WebSocket protocol
            _ => {}
        }
    }
}
