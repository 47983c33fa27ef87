//! UseCase layer errors.

use thiserror::Error;

use crate::domain::{HubError, RepositoryError};

/// 接続処理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("Connection '{0}' is already registered")]
    DuplicateConnection(String),
}

/// 切断処理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisconnectError {
    #[error("Connection '{0}' not found")]
    ConnectionNotFound(String),
}

/// broadcaster 宣言のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnounceError {
    #[error("Connection '{0}' not found")]
    ConnectionNotFound(String),

    #[error("{0}")]
    RoleConflict(String),
}

/// watch 要求のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WatchError {
    #[error("Connection '{0}' not found")]
    ConnectionNotFound(String),

    #[error("{0}")]
    RoleConflict(String),
}

impl From<RepositoryError> for ConnectError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Hub(HubError::DuplicateConnection(id))
            | RepositoryError::Hub(HubError::ConnectionNotFound(id))
            | RepositoryError::Hub(HubError::RoleConflict { id, .. }) => {
                ConnectError::DuplicateConnection(id.into_string())
            }
        }
    }
}

impl From<RepositoryError> for DisconnectError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Hub(HubError::DuplicateConnection(id))
            | RepositoryError::Hub(HubError::ConnectionNotFound(id))
            | RepositoryError::Hub(HubError::RoleConflict { id, .. }) => {
                DisconnectError::ConnectionNotFound(id.into_string())
            }
        }
    }
}

impl From<RepositoryError> for AnnounceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Hub(conflict @ HubError::RoleConflict { .. }) => {
                AnnounceError::RoleConflict(conflict.to_string())
            }
            RepositoryError::Hub(HubError::DuplicateConnection(id))
            | RepositoryError::Hub(HubError::ConnectionNotFound(id)) => {
                AnnounceError::ConnectionNotFound(id.into_string())
            }
        }
    }
}

impl From<RepositoryError> for WatchError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Hub(conflict @ HubError::RoleConflict { .. }) => {
                WatchError::RoleConflict(conflict.to_string())
            }
            RepositoryError::Hub(HubError::DuplicateConnection(id))
            | RepositoryError::Hub(HubError::ConnectionNotFound(id)) => {
                WatchError::ConnectionNotFound(id.into_string())
            }
        }
    }
}
