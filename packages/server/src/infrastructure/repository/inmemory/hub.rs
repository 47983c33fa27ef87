//! InMemory Hub Repository 実装
//!
//! ドメイン層が定義する HubRepository trait の具体的な実装。
//! `Hub` ドメインモデルを `Mutex` で包んでインメモリ DB として使用します。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Announcement, ConnectionId, Departure, Hub, HubRepository, HubSnapshot, RepositoryError,
    Timestamp,
};

/// インメモリ Hub Repository 実装
pub struct InMemoryHubRepository {
    hub: Arc<Mutex<Hub>>,
}

impl InMemoryHubRepository {
    pub fn new(hub: Arc<Mutex<Hub>>) -> Self {
        Self { hub }
    }
}

impl Default for InMemoryHubRepository {
    fn default() -> Self {
        Self::new(Arc::new(Mutex::new(Hub::new())))
    }
}

#[async_trait]
impl HubRepository for InMemoryHubRepository {
    async fn add_connection(
        &self,
        id: ConnectionId,
        connected_at: Timestamp,
    ) -> Result<usize, RepositoryError> {
        let mut hub = self.hub.lock().await;
        Ok(hub.open(id, connected_at)?)
    }

    async fn remove_connection(&self, id: &ConnectionId) -> Result<Departure, RepositoryError> {
        let mut hub = self.hub.lock().await;
        Ok(hub.close(id)?)
    }

    async fn announce_broadcaster(
        &self,
        id: &ConnectionId,
    ) -> Result<Announcement, RepositoryError> {
        let mut hub = self.hub.lock().await;
        Ok(hub.announce_broadcaster(id)?)
    }

    async fn request_watch(
        &self,
        viewer: &ConnectionId,
    ) -> Result<Option<ConnectionId>, RepositoryError> {
        let mut hub = self.hub.lock().await;
        Ok(hub.request_watch(viewer)?)
    }

    async fn contains(&self, id: &ConnectionId) -> bool {
        self.hub.lock().await.contains(id)
    }

    async fn get_all_connection_ids(&self) -> Vec<ConnectionId> {
        self.hub.lock().await.ids()
    }

    async fn snapshot(&self) -> HubSnapshot {
        self.hub.lock().await.snapshot()
    }
}
