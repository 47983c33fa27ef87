//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - 接続の登録と、接続数の全員へのブロードキャスト
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規接続（本人を含む全員に update-viewers が届く）
//! - 異常系：重複した ID での接続試行

use std::sync::Arc;

use relaycast_shared::time::{Clock, SystemClock};

use crate::domain::{
    ConnectionId, HubRepository, MessagePusher, Notification, PusherChannel, Timestamp,
};

use super::error::ConnectError;

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    repository: Arc<dyn HubRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl ConnectParticipantUseCase {
    pub fn new(repository: Arc<dyn HubRepository>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self::with_clock(repository, message_pusher, Arc::new(SystemClock))
    }

    pub fn with_clock(
        repository: Arc<dyn HubRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            clock,
        }
    }

    /// 参加者接続を実行
    ///
    /// 接続を Hub に登録し、送信キューを MessagePusher に登録した後、
    /// 新しい接続数を本人を含む全員にブロードキャストします。
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - 登録後の接続数
    /// * `Err(ConnectError)` - 同じ ID が既に登録されている
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        sender: PusherChannel,
    ) -> Result<usize, ConnectError> {
        // 1. Hub に接続を追加
        let connected_at = Timestamp::new(self.clock.now_millis());
        let count = self
            .repository
            .add_connection(connection_id.clone(), connected_at)
            .await?;

        // 2. MessagePusher に送信キューを登録
        self.message_pusher
            .register_client(connection_id.clone(), sender)
            .await;
        tracing::info!("Connection '{}' opened ({} connected)", connection_id, count);

        // 3. 接続数を全員にブロードキャスト
        let targets = self.repository.get_all_connection_ids().await;
        if let Err(e) = self
            .message_pusher
            .broadcast(targets, &Notification::ViewerCount(count))
            .await
        {
            tracing::warn!("Failed to broadcast viewer count: {}", e);
        }

        Ok(count)
    }
}
