//! UseCase: broadcaster 宣言
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - AnnounceBroadcasterUseCase::execute() メソッド
//! - `broadcaster` が宣言者以外の全員に届くこと
//! - takeover 時に旧 broadcaster とその audience へ `takeover` が先に届くこと
//!
//! ### どのような状況を想定しているか
//! - 正常系：最初の宣言、takeover（通知あり／なし）
//! - 異常系：viewer による宣言（ロール衝突）

use std::sync::Arc;

use crate::domain::{Announcement, ConnectionId, HubRepository, MessagePusher, Notification};

use super::error::AnnounceError;

/// broadcaster 宣言のユースケース
pub struct AnnounceBroadcasterUseCase {
    repository: Arc<dyn HubRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    /// 置き換えられた broadcaster と audience に `takeover` を送るか
    notify_takeover: bool,
}

impl AnnounceBroadcasterUseCase {
    pub fn new(
        repository: Arc<dyn HubRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        notify_takeover: bool,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            notify_takeover,
        }
    }

    pub async fn execute(&self, announcer: &ConnectionId) -> Result<Announcement, AnnounceError> {
        let announcement = self.repository.announce_broadcaster(announcer).await?;

        if let Some(takeover) = &announcement.takeover {
            tracing::info!(
                "Broadcaster '{}' replaced by '{}' ({} viewers displaced)",
                takeover.previous,
                announcer,
                takeover.audience.len()
            );
            if self.notify_takeover {
                let mut targets = Vec::with_capacity(takeover.audience.len() + 1);
                targets.push(takeover.previous.clone());
                targets.extend(takeover.audience.iter().cloned());
                let notification = Notification::Takeover {
                    broadcaster: announcer.clone(),
                };
                if let Err(e) = self.message_pusher.broadcast(targets, &notification).await {
                    tracing::warn!("Failed to send takeover notice: {}", e);
                }
            }
        } else {
            tracing::info!("Connection '{}' announced as broadcaster", announcer);
        }

        if let Err(e) = self
            .message_pusher
            .broadcast(
                announcement.recipients.clone(),
                &Notification::BroadcasterAnnounced,
            )
            .await
        {
            tracing::warn!("Failed to broadcast announcement: {}", e);
        }

        Ok(announcement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::testing::{connect, create_pusher, create_repository, drain, id};

    const ANNOUNCE: &str = r#"{"event":"broadcaster"}"#;

    #[tokio::test]
    async fn test_announce_reaches_everyone_but_announcer() {
        // テスト項目: broadcaster 宣言は宣言者以外の全員に届く
        // given (前提条件):
        let repository = create_repository();
        let pusher = create_pusher();
        let mut rx_b = connect(&repository, &pusher, "b").await;
        let mut rx_v = connect(&repository, &pusher, "v").await;
        let usecase = AnnounceBroadcasterUseCase::new(repository.clone(), pusher, true);

        // when (操作):
        let result = usecase.execute(&id("b")).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert!(drain(&mut rx_b).is_empty());
        assert_eq!(drain(&mut rx_v), vec![ANNOUNCE.to_string()]);
    }

    #[tokio::test]
    async fn test_takeover_notice_precedes_announce() {
        // テスト項目: takeover 時は旧 broadcaster と audience に takeover が先に届き、その後 broadcaster が届く
        // given (前提条件):
        let repository = create_repository();
        let pusher = create_pusher();
        let mut rx_b1 = connect(&repository, &pusher, "b1").await;
        let mut rx_b2 = connect(&repository, &pusher, "b2").await;
        let mut rx_v = connect(&repository, &pusher, "v").await;
        let usecase = AnnounceBroadcasterUseCase::new(repository.clone(), pusher, true);
        usecase.execute(&id("b1")).await.unwrap();
        repository.request_watch(&id("v")).await.unwrap();
        drain(&mut rx_b2);
        drain(&mut rx_v);

        // when (操作):
        usecase.execute(&id("b2")).await.unwrap();

        // then (期待する結果):
        let takeover = r#"{"event":"takeover","data":"b2"}"#.to_string();
        assert_eq!(drain(&mut rx_b1), vec![takeover.clone(), ANNOUNCE.to_string()]);
        assert_eq!(drain(&mut rx_v), vec![takeover, ANNOUNCE.to_string()]);
        assert!(drain(&mut rx_b2).is_empty());
        assert_eq!(
            repository.snapshot().await.current_broadcaster,
            Some(id("b2"))
        );
    }

    #[tokio::test]
    async fn test_takeover_notice_can_be_disabled() {
        // テスト項目: 通知を無効にすると takeover は送られず、broadcaster だけが届く
        // given (前提条件):
        let repository = create_repository();
        let pusher = create_pusher();
        let mut rx_b1 = connect(&repository, &pusher, "b1").await;
        let _rx_b2 = connect(&repository, &pusher, "b2").await;
        let usecase = AnnounceBroadcasterUseCase::new(repository.clone(), pusher, false);
        usecase.execute(&id("b1")).await.unwrap();

        // when (操作):
        let announcement = usecase.execute(&id("b2")).await.unwrap();

        // then (期待する結果):
        assert!(announcement.takeover.is_some());
        assert_eq!(drain(&mut rx_b1), vec![ANNOUNCE.to_string()]);
    }

    #[tokio::test]
    async fn test_viewer_announce_is_rejected() {
        // テスト項目: viewer による broadcaster 宣言はロール衝突になり、誰にも配信されない
        // given (前提条件):
        let repository = create_repository();
        let pusher = create_pusher();
        let _rx_v = connect(&repository, &pusher, "v").await;
        let mut rx_x = connect(&repository, &pusher, "x").await;
        repository.request_watch(&id("v")).await.unwrap();
        let usecase = AnnounceBroadcasterUseCase::new(repository.clone(), pusher, true);

        // when (操作):
        let result = usecase.execute(&id("v")).await;

        // then (期待する結果):
        assert!(matches!(result, Err(AnnounceError::RoleConflict(_))));
        assert!(drain(&mut rx_x).is_empty());
    }
}
