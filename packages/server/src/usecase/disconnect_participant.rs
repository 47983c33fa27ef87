//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - disconnectPeer の配送先と、残りの接続への接続数ブロードキャスト
//!
//! ### どのような状況を想定しているか
//! - 正常系：viewer の切断（broadcaster に一度だけ通知）
//! - 正常系：broadcaster の切断（audience 全員に通知）
//! - 異常系：存在しない接続の切断

use std::sync::Arc;

use crate::domain::{ConnectionId, Departure, HubRepository, MessagePusher, Notification};

use super::error::DisconnectError;

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    repository: Arc<dyn HubRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectParticipantUseCase {
    pub fn new(repository: Arc<dyn HubRepository>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 参加者切断を実行
    ///
    /// 送信キューを先に登録解除するので、切断した本人には何も送られません。
    pub async fn execute(&self, connection_id: &ConnectionId) -> Result<Departure, DisconnectError> {
        // 1. MessagePusher から登録解除
        self.message_pusher.unregister_client(connection_id).await;

        // 2. Hub から削除
        let departure = self.repository.remove_connection(connection_id).await?;
        tracing::info!(
            "Connection '{}' ({}) closed ({} connected)",
            connection_id,
            departure.connection.role,
            departure.remaining
        );

        // 3. 関係する peer に disconnectPeer を通知
        let notification = Notification::PeerDisconnected {
            peer: connection_id.clone(),
        };
        for peer in &departure.notify {
            if let Err(e) = self.message_pusher.push_to(peer, &notification).await {
                tracing::warn!("Failed to notify '{}' of disconnect: {}", peer, e);
            }
        }

        // 4. 接続数を残りの全員にブロードキャスト
        let targets = self.repository.get_all_connection_ids().await;
        if let Err(e) = self
            .message_pusher
            .broadcast(targets, &Notification::ViewerCount(departure.remaining))
            .await
        {
            tracing::warn!("Failed to broadcast viewer count: {}", e);
        }

        Ok(departure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::testing::{connect, create_pusher, create_repository, drain, id};

    #[tokio::test]
    async fn test_disconnect_viewer_notifies_broadcaster() {
        // テスト項目: viewer の切断は broadcaster に disconnectPeer を一度だけ送り、全員に接続数を送る
        // given (前提条件):
        let repository = create_repository();
        let pusher = create_pusher();
        let mut rx_b = connect(&repository, &pusher, "b").await;
        let _rx_v = connect(&repository, &pusher, "v").await;
        let mut rx_x = connect(&repository, &pusher, "x").await;
        repository.announce_broadcaster(&id("b")).await.unwrap();
        repository.request_watch(&id("v")).await.unwrap();
        let usecase = DisconnectParticipantUseCase::new(repository.clone(), pusher);

        // when (操作):
        let result = usecase.execute(&id("v")).await;

        // then (期待する結果):
        let departure = result.unwrap();
        assert_eq!(departure.notify, vec![id("b")]);
        assert_eq!(
            drain(&mut rx_b),
            vec![
                r#"{"event":"disconnectPeer","data":"v"}"#.to_string(),
                r#"{"event":"update-viewers","data":2}"#.to_string(),
            ]
        );
        assert_eq!(
            drain(&mut rx_x),
            vec![r#"{"event":"update-viewers","data":2}"#.to_string()]
        );
    }

    #[tokio::test]
    async fn test_disconnect_broadcaster_notifies_audience() {
        // テスト項目: broadcaster の切断は audience の viewer に disconnectPeer を送る
        // given (前提条件):
        let repository = create_repository();
        let pusher = create_pusher();
        let _rx_b = connect(&repository, &pusher, "b").await;
        let mut rx_v = connect(&repository, &pusher, "v").await;
        repository.announce_broadcaster(&id("b")).await.unwrap();
        repository.request_watch(&id("v")).await.unwrap();
        let usecase = DisconnectParticipantUseCase::new(repository.clone(), pusher);

        // when (操作):
        usecase.execute(&id("b")).await.unwrap();

        // then (期待する結果):
        assert_eq!(
            drain(&mut rx_v),
            vec![
                r#"{"event":"disconnectPeer","data":"b"}"#.to_string(),
                r#"{"event":"update-viewers","data":1}"#.to_string(),
            ]
        );
        assert_eq!(repository.snapshot().await.current_broadcaster, None);
    }

    #[tokio::test]
    async fn test_disconnect_unknown_connection() {
        // テスト項目: 存在しない接続の切断はエラーになる
        // given (前提条件):
        let usecase = DisconnectParticipantUseCase::new(create_repository(), create_pusher());

        // when (操作):
        let result = usecase.execute(&id("ghost")).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(DisconnectError::ConnectionNotFound("ghost".to_string()))
        );
    }
}
