//! UseCase: Hub State の取得

use std::sync::Arc;

use crate::domain::{HubRepository, HubSnapshot};

/// Hub State 取得のユースケース（読み取り専用）
pub struct GetHubStateUseCase {
    repository: Arc<dyn HubRepository>,
}

impl GetHubStateUseCase {
    pub fn new(repository: Arc<dyn HubRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self) -> HubSnapshot {
        self.repository.snapshot().await
    }
}
