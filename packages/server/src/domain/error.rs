//! Domain layer errors.

use thiserror::Error;

use super::value_object::{ConnectionId, Role};

/// Value object validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("Connection ID must not be empty")]
    EmptyConnectionId,

    #[error("Connection ID is too long ({0} bytes)")]
    ConnectionIdTooLong(usize),
}

/// Hub State invariant violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    #[error("Connection '{0}' is already registered")]
    DuplicateConnection(ConnectionId),

    #[error("Connection '{0}' not found")]
    ConnectionNotFound(ConnectionId),

    /// The connection already announced a different role.
    #[error("Connection '{id}' is a {current} and cannot become a {requested}")]
    RoleConflict {
        id: ConnectionId,
        current: Role,
        requested: Role,
    },
}

/// Repository errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Hub(#[from] HubError),
}

/// Errors raised while pushing a message to a connection's outbound queue
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("Client '{0}' not found")]
    ClientNotFound(String),

    #[error("Failed to push message: {0}")]
    PushFailed(String),

    #[error("Failed to encode message: {0}")]
    EncodeFailed(String),
}
