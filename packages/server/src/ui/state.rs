//! Shared application state.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::usecase::GetHubStateUseCase;

use super::dispatcher::RelayCommand;

/// State handed to every axum handler.
pub struct AppState {
    /// Entry point of the single-writer dispatcher
    pub commands: mpsc::Sender<RelayCommand>,
    /// Read-only view for the HTTP status endpoint
    pub get_hub_state_usecase: Arc<GetHubStateUseCase>,
    /// Capacity of each connection's outbound queue
    pub outbound_queue: usize,
}
