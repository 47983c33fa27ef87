//! UI layer: HTTP routes, the WebSocket endpoint and the dispatcher task.

pub mod dispatcher;
mod handler;
mod server;
mod signal;
pub mod state;

pub use dispatcher::{Dispatcher, RelayCommand};
pub use server::Server;
pub use signal::shutdown_signal;
