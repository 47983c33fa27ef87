//! UseCase layer: one use case per relay operation.
//!
//! Each use case mutates the Hub through `HubRepository` and fans out through
//! `MessagePusher`. Callers serialize execution (see `ui::dispatcher`).

pub mod announce_broadcaster;
pub mod connect_participant;
pub mod disconnect_participant;
pub mod error;
pub mod get_hub_state;
pub mod relay_signal;
pub mod request_watch;
pub mod send_message;

pub use announce_broadcaster::AnnounceBroadcasterUseCase;
pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{AnnounceError, ConnectError, DisconnectError, WatchError};
pub use get_hub_state::GetHubStateUseCase;
pub use relay_signal::{Delivery, RelaySignalUseCase};
pub use request_watch::RequestWatchUseCase;
pub use send_message::SendMessageUseCase;
