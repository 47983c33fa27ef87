//! Server configuration.

/// Default capacity of each connection's outbound queue.
pub const DEFAULT_OUTBOUND_QUEUE: usize = 256;

/// Default capacity of the dispatcher's inbound command queue.
pub const DEFAULT_COMMAND_QUEUE: usize = 1024;

/// Runtime configuration of the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Frames that may wait for a slow connection before it is dropped
    pub outbound_queue: usize,
    /// Commands that may wait for the dispatcher before readers are paused
    pub command_queue: usize,
    /// Send `takeover` to a displaced broadcaster and its viewers
    pub takeover_notice: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            outbound_queue: DEFAULT_OUTBOUND_QUEUE,
            command_queue: DEFAULT_COMMAND_QUEUE,
            takeover_notice: true,
        }
    }
}
