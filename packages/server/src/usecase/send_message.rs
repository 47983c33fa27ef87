//! UseCase: チャットメッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 送信者を含む全員に本文がそのまま届くこと（送信者は自分のエコーで表示する）

use std::sync::Arc;

use crate::domain::{ChatText, ConnectionId, HubRepository, MessagePusher, Notification};

/// チャットメッセージ送信のユースケース
pub struct SendMessageUseCase {
    repository: Arc<dyn HubRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl SendMessageUseCase {
    pub fn new(repository: Arc<dyn HubRepository>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// メッセージ送信を実行し、ブロードキャスト対象を返す
    pub async fn execute(&self, from: &ConnectionId, text: ChatText) -> Vec<ConnectionId> {
        let targets = self.repository.get_all_connection_ids().await;
        tracing::debug!("Chat from '{}' to {} connections", from, targets.len());

        if let Err(e) = self
            .message_pusher
            .broadcast(targets.clone(), &Notification::Chat(text))
            .await
        {
            tracing::warn!("Failed to broadcast chat message: {}", e);
        }

        targets
    }
}
