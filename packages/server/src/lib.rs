//! Relaycast signaling relay.
//!
//! Routes negotiation messages between one broadcaster and its viewers over
//! WebSocket, and fans out chat and viewer counts to every connection.

pub mod app;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub use app::build_server;
pub use config::ServerConfig;
