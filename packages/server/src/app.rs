//! Dependency wiring.

use std::sync::Arc;

use crate::{
    config::ServerConfig,
    infrastructure::{message_pusher::WebSocketMessagePusher, repository::InMemoryHubRepository},
    ui::{Dispatcher, Server},
    usecase::{
        AnnounceBroadcasterUseCase, ConnectParticipantUseCase, DisconnectParticipantUseCase,
        GetHubStateUseCase, RelaySignalUseCase, RequestWatchUseCase, SendMessageUseCase,
    },
};

/// Build a ready-to-run server from `config`.
///
/// Dependencies are created in order: Repository, MessagePusher, UseCases,
/// Dispatcher, Server.
pub fn build_server(config: &ServerConfig) -> Server {
    // 1. Repository (in-memory Hub State)
    let repository = Arc::new(InMemoryHubRepository::default());

    // 2. MessagePusher (WebSocket implementation)
    let message_pusher = Arc::new(WebSocketMessagePusher::default());

    // 3. UseCases
    let connect_participant_usecase = Arc::new(ConnectParticipantUseCase::new(
        repository.clone(),
        message_pusher.clone(),
    ));
    let disconnect_participant_usecase = Arc::new(DisconnectParticipantUseCase::new(
        repository.clone(),
        message_pusher.clone(),
    ));
    let announce_broadcaster_usecase = Arc::new(AnnounceBroadcasterUseCase::new(
        repository.clone(),
        message_pusher.clone(),
        config.takeover_notice,
    ));
    let request_watch_usecase = Arc::new(RequestWatchUseCase::new(
        repository.clone(),
        message_pusher.clone(),
    ));
    let relay_signal_usecase = Arc::new(RelaySignalUseCase::new(
        repository.clone(),
        message_pusher.clone(),
    ));
    let send_message_usecase = Arc::new(SendMessageUseCase::new(
        repository.clone(),
        message_pusher,
    ));
    let get_hub_state_usecase = Arc::new(GetHubStateUseCase::new(repository.clone()));

    // 4. Dispatcher and Server
    let dispatcher = Dispatcher::new(
        repository,
        connect_participant_usecase,
        disconnect_participant_usecase,
        announce_broadcaster_usecase,
        request_watch_usecase,
        relay_signal_usecase,
        send_message_usecase,
    );
    Server::new(
        dispatcher,
        get_hub_state_usecase,
        config.outbound_queue,
        config.command_queue,
    )
}
