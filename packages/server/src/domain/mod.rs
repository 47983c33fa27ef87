//! Domain layer: Hub State, its entities and value objects, and the ports the
//! use cases drive (`HubRepository`, `MessagePusher`).

pub mod entity;
pub mod error;
pub mod factory;
pub mod hub;
pub mod notification;
pub mod pusher;
pub mod repository;
pub mod value_object;

pub use entity::Connection;
pub use error::{HubError, MessagePushError, RepositoryError, ValueObjectError};
pub use factory::ConnectionIdFactory;
pub use hub::{Announcement, Departure, Hub, HubSnapshot, Takeover};
pub use notification::{Notification, SignalKind};
pub use pusher::{MessagePusher, PusherChannel};
pub use repository::HubRepository;
pub use value_object::{ChatText, ConnectionId, Role, SignalPayload, Timestamp};

#[cfg(test)]
pub use pusher::MockMessagePusher;
