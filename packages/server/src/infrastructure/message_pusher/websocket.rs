//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの送信キュー（bounded `mpsc::Sender`）を管理
//! - `Notification` を JSON フレームにエンコードして送信（push_to, broadcast）
//!
//! ## 設計ノート
//!
//! キューの生成と消費は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は受け取った sender に `try_send` するだけで、他の接続の I/O を待ちません。
//! キューが満杯の接続は消費が止まっているとみなし、sender を破棄します。
//! sender が無くなると UI 層の送信タスクが終了し、接続が閉じられます。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc::error::TrySendError};

use crate::{
    domain::{ConnectionId, MessagePushError, MessagePusher, Notification, PusherChannel},
    infrastructure::dto::websocket::ServerEvent,
};

/// WebSocket を使った MessagePusher 実装
pub struct WebSocketMessagePusher {
    /// 接続中のクライアントの送信キュー
    clients: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>,
}

impl WebSocketMessagePusher {
    pub fn new(clients: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>) -> Self {
        Self { clients }
    }

    fn encode(notification: &Notification) -> Result<String, MessagePushError> {
        let event = ServerEvent::from(notification.clone());
        serde_json::to_string(&event).map_err(|e| MessagePushError::EncodeFailed(e.to_string()))
    }

    /// Enqueue one frame, evicting the queue when it is full or closed.
    fn enqueue(
        clients: &mut HashMap<ConnectionId, PusherChannel>,
        client_id: &ConnectionId,
        frame: String,
    ) -> Result<(), MessagePushError> {
        let Some(sender) = clients.get(client_id) else {
            return Err(MessagePushError::ClientNotFound(client_id.to_string()));
        };

        match sender.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                clients.remove(client_id);
                tracing::warn!(
                    "Outbound queue of '{}' is full, dropping the connection",
                    client_id
                );
                Err(MessagePushError::PushFailed(format!(
                    "outbound queue of '{}' is full",
                    client_id
                )))
            }
            Err(TrySendError::Closed(_)) => {
                clients.remove(client_id);
                Err(MessagePushError::PushFailed(format!(
                    "outbound queue of '{}' is closed",
                    client_id
                )))
            }
        }
    }
}

impl Default for WebSocketMessagePusher {
    fn default() -> Self {
        Self::new(Arc::new(Mutex::new(HashMap::new())))
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, client_id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        tracing::debug!("Client '{}' registered to MessagePusher", client_id);
        clients.insert(client_id, sender);
    }

    async fn unregister_client(&self, client_id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        clients.remove(client_id);
        tracing::debug!("Client '{}' unregistered from MessagePusher", client_id);
    }

    async fn push_to(
        &self,
        client_id: &ConnectionId,
        notification: &Notification,
    ) -> Result<(), MessagePushError> {
        let frame = Self::encode(notification)?;
        let mut clients = self.clients.lock().await;
        Self::enqueue(&mut clients, client_id, frame)?;
        tracing::debug!("Pushed message to client '{}'", client_id);
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        notification: &Notification,
    ) -> Result<(), MessagePushError> {
        let frame = Self::encode(notification)?;
        let mut clients = self.clients.lock().await;

        for target in targets {
            // ブロードキャストでは一部の送信失敗を許容
            if let Err(e) = Self::enqueue(&mut clients, &target, frame.clone()) {
                tracing::warn!("Failed to push message to client '{}': {}", target, e);
            }
        }

        Ok(())
    }
}
