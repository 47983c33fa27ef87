//! Error types for the participant client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Could not open or keep the signaling channel
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Outbound frame could not be encoded
    #[error("Failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}
