//! Identifier generation.

use uuid::Uuid;

use super::value_object::ConnectionId;

/// Generates fresh connection identifiers.
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    /// Generate a new random (v4 UUID) connection id.
    pub fn generate() -> ConnectionId {
        // A hyphenated UUID is 36 bytes, always within the ConnectionId bounds.
        match ConnectionId::new(Uuid::new_v4().to_string()) {
            Ok(id) => id,
            Err(e) => unreachable!("generated UUID rejected: {}", e),
        }
    }
}
