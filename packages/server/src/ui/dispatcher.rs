//! Single-writer dispatcher.
//!
//! Every connection task forwards its lifecycle and inbound events here as
//! [`RelayCommand`]s. One task executes them strictly in arrival order, so
//! Hub mutations and the fan-out they trigger never interleave. Fan-out only
//! enqueues onto per-connection queues and never waits on a socket.
//!
//! The command queue is bounded. When it is full, connection readers wait in
//! `send().await` and stop pulling frames off their sockets until the
//! dispatcher catches up.

use std::sync::Arc;

use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    domain::{ChatText, ConnectionId, HubRepository, PusherChannel, SignalKind, SignalPayload},
    infrastructure::dto::websocket::ClientEvent,
    usecase::{
        AnnounceBroadcasterUseCase, ConnectParticipantUseCase, DisconnectParticipantUseCase,
        RelaySignalUseCase, RequestWatchUseCase, SendMessageUseCase,
    },
};

/// Work item for the dispatcher.
#[derive(Debug)]
pub enum RelayCommand {
    /// A channel was opened; `sender` is its outbound queue.
    Open {
        id: ConnectionId,
        sender: PusherChannel,
    },
    /// A parsed event arrived on a channel.
    Inbound {
        id: ConnectionId,
        event: ClientEvent,
    },
    /// A channel was closed.
    Close { id: ConnectionId },
}

pub struct Dispatcher {
    repository: Arc<dyn HubRepository>,
    connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    announce_broadcaster_usecase: Arc<AnnounceBroadcasterUseCase>,
    request_watch_usecase: Arc<RequestWatchUseCase>,
    relay_signal_usecase: Arc<RelaySignalUseCase>,
    send_message_usecase: Arc<SendMessageUseCase>,
}

impl Dispatcher {
    pub fn new(
        repository: Arc<dyn HubRepository>,
        connect_participant_usecase: Arc<ConnectParticipantUseCase>,
        disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
        announce_broadcaster_usecase: Arc<AnnounceBroadcasterUseCase>,
        request_watch_usecase: Arc<RequestWatchUseCase>,
        relay_signal_usecase: Arc<RelaySignalUseCase>,
        send_message_usecase: Arc<SendMessageUseCase>,
    ) -> Self {
        Self {
            repository,
            connect_participant_usecase,
            disconnect_participant_usecase,
            announce_broadcaster_usecase,
            request_watch_usecase,
            relay_signal_usecase,
            send_message_usecase,
        }
    }

    /// Start the dispatcher task.
    ///
    /// At most `capacity` commands wait in the queue. The task ends once every
    /// clone of the returned sender is dropped.
    pub fn spawn(self, capacity: usize) -> (mpsc::Sender<RelayCommand>, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel(capacity);
        let handle = tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                self.handle(command).await;
            }
            tracing::debug!("Dispatcher stopped");
        });
        (tx, handle)
    }

    async fn handle(&self, command: RelayCommand) {
        match command {
            RelayCommand::Open { id, sender } => {
                if let Err(e) = self.connect_participant_usecase.execute(id, sender).await {
                    tracing::warn!("Rejected connection: {}", e);
                }
            }
            RelayCommand::Inbound { id, event } => self.handle_event(id, event).await,
            RelayCommand::Close { id } => {
                if let Err(e) = self.disconnect_participant_usecase.execute(&id).await {
                    tracing::warn!("Failed to close connection: {}", e);
                }
            }
        }
    }

    async fn handle_event(&self, id: ConnectionId, event: ClientEvent) {
        if !self.repository.contains(&id).await {
            tracing::warn!("Dropped event from unregistered connection '{}'", id);
            return;
        }

        match event {
            ClientEvent::Broadcaster => {
                if let Err(e) = self.announce_broadcaster_usecase.execute(&id).await {
                    tracing::warn!("Dropped broadcaster announce: {}", e);
                }
            }
            ClientEvent::Watcher => {
                if let Err(e) = self.request_watch_usecase.execute(&id).await {
                    tracing::warn!("Dropped watch request: {}", e);
                }
            }
            ClientEvent::Offer(target, blob) => {
                self.relay(&id, SignalKind::Offer, target, blob).await;
            }
            ClientEvent::Answer(target, blob) => {
                self.relay(&id, SignalKind::Answer, target, blob).await;
            }
            ClientEvent::Candidate(target, blob) => {
                self.relay(&id, SignalKind::Candidate, target, blob).await;
            }
            ClientEvent::SendMessage(text) => {
                self.send_message_usecase
                    .execute(&id, ChatText::new(text))
                    .await;
            }
        }
    }

    async fn relay(
        &self,
        from: &ConnectionId,
        kind: SignalKind,
        target: String,
        blob: serde_json::Value,
    ) {
        self.relay_signal_usecase
            .execute(from, kind, &target, SignalPayload::new(blob))
            .await;
    }
}
