//! Repository trait 定義
//!
//! ドメイン層が必要とする Hub State へのアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    Announcement, ConnectionId, Departure, HubSnapshot, RepositoryError, Timestamp,
};

/// Hub Repository trait
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
/// 各メソッドは Hub State に対する一つの不可分な操作です。
#[async_trait]
pub trait HubRepository: Send + Sync {
    /// 接続を登録し、登録後の接続数を返す
    async fn add_connection(
        &self,
        id: ConnectionId,
        connected_at: Timestamp,
    ) -> Result<usize, RepositoryError>;

    /// 接続を削除し、disconnectPeer の通知先を返す
    async fn remove_connection(&self, id: &ConnectionId) -> Result<Departure, RepositoryError>;

    /// broadcaster として宣言する
    async fn announce_broadcaster(
        &self,
        id: &ConnectionId,
    ) -> Result<Announcement, RepositoryError>;

    /// viewer として watch を要求し、配送先の broadcaster を返す
    async fn request_watch(
        &self,
        viewer: &ConnectionId,
    ) -> Result<Option<ConnectionId>, RepositoryError>;

    /// 接続が存在するか
    async fn contains(&self, id: &ConnectionId) -> bool;

    /// 接続中の全ての ID を取得
    async fn get_all_connection_ids(&self) -> Vec<ConnectionId>;

    /// Hub State のスナップショットを取得
    async fn snapshot(&self) -> HubSnapshot;
}
