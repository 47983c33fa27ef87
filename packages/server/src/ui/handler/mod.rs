mod http;
mod websocket;

pub use http::{get_status, health_check};
pub use websocket::websocket_handler;
