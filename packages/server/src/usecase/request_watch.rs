//! UseCase: watch 要求
//!
//! viewer の `watcher` を現在の broadcaster に配送します。
//! broadcaster が居なければ要求は黙って捨てられます。

use std::sync::Arc;

use crate::domain::{ConnectionId, HubRepository, MessagePusher, Notification};

use super::error::WatchError;

/// watch 要求のユースケース
pub struct RequestWatchUseCase {
    repository: Arc<dyn HubRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl RequestWatchUseCase {
    pub fn new(repository: Arc<dyn HubRepository>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// # Returns
    ///
    /// * `Ok(Some(broadcaster))` - 要求を配送した broadcaster
    /// * `Ok(None)` - broadcaster 不在のため破棄
    pub async fn execute(&self, viewer: &ConnectionId) -> Result<Option<ConnectionId>, WatchError> {
        let Some(broadcaster) = self.repository.request_watch(viewer).await? else {
            tracing::debug!("Watch request from '{}' dropped: no broadcaster", viewer);
            return Ok(None);
        };

        let notification = Notification::WatchRequested {
            viewer: viewer.clone(),
        };
        if let Err(e) = self
            .message_pusher
            .push_to(&broadcaster, &notification)
            .await
        {
            tracing::warn!("Failed to route watch request to '{}': {}", broadcaster, e);
        }

        Ok(Some(broadcaster))
    }
}
