//! UseCase: offer / answer / candidate の中継
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RelaySignalUseCase::execute() が送信者の ID を付けて宛先にだけ配送すること
//! - 宛先が存在しない場合に黙って破棄されること
//!
//! MessagePusher は mockall のモックで差し替えて、呼び出しそのものを検証します。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, HubRepository, MessagePusher, Notification, SignalKind, SignalPayload,
};

/// 中継結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// 宛先が存在しない、または送信キューに積めなかった
    Dropped,
}

/// 中継のユースケース
///
/// 送信者のロールは見ずに、存在する宛先へそのまま運びます。
pub struct RelaySignalUseCase {
    repository: Arc<dyn HubRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl RelaySignalUseCase {
    pub fn new(repository: Arc<dyn HubRepository>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    pub async fn execute(
        &self,
        from: &ConnectionId,
        kind: SignalKind,
        target: &str,
        payload: SignalPayload,
    ) -> Delivery {
        let Ok(target) = ConnectionId::new(target.to_string()) else {
            tracing::debug!("Dropped {} from '{}': invalid target", kind.as_str(), from);
            return Delivery::Dropped;
        };
        if !self.repository.contains(&target).await {
            tracing::debug!(
                "Dropped {} from '{}': target '{}' is gone",
                kind.as_str(),
                from,
                target
            );
            return Delivery::Dropped;
        }

        let notification = Notification::Signal {
            kind,
            from: from.clone(),
            payload,
        };
        match self.message_pusher.push_to(&target, &notification).await {
            Ok(()) => {
                tracing::debug!("Relayed {} '{}' -> '{}'", kind.as_str(), from, target);
                Delivery::Delivered
            }
            Err(e) => {
                tracing::warn!("Failed to relay {} to '{}': {}", kind.as_str(), target, e);
                Delivery::Dropped
            }
        }
    }
}
