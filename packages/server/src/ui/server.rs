//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::usecase::GetHubStateUseCase;

use super::{
    dispatcher::Dispatcher,
    handler::{get_status, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Signaling relay server
///
/// ```ignore
/// let server = build_server(&ServerConfig::default());
/// server.run("127.0.0.1", 3001).await?;
/// ```
pub struct Server {
    dispatcher: Dispatcher,
    get_hub_state_usecase: Arc<GetHubStateUseCase>,
    outbound_queue: usize,
    command_queue: usize,
}

impl Server {
    pub fn new(
        dispatcher: Dispatcher,
        get_hub_state_usecase: Arc<GetHubStateUseCase>,
        outbound_queue: usize,
        command_queue: usize,
    ) -> Self {
        Self {
            dispatcher,
            get_hub_state_usecase,
            outbound_queue,
            command_queue,
        }
    }

    /// Bind to `host:port` and serve until Ctrl+C or SIGTERM.
    pub async fn run(self, host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Signaling relay listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (commands, dispatcher_task) = self.dispatcher.spawn(self.command_queue.max(1));
        let app_state = Arc::new(AppState {
            commands,
            get_hub_state_usecase: self.get_hub_state_usecase,
            outbound_queue: self.outbound_queue.max(1),
        });

        let app = Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/status", get(get_status))
            .with_state(app_state)
            .layer(TraceLayer::new_for_http());

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        dispatcher_task.abort();
        result
    }
}
