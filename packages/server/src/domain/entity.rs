//! Domain entities.

use serde::Serialize;

use super::{
    error::HubError,
    value_object::{ConnectionId, Role, Timestamp},
};

/// One open channel, owned exclusively by the Hub.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub role: Role,
    pub connected_at: Timestamp,
}

impl Connection {
    /// Create a connection with no announced role yet.
    pub fn new(id: ConnectionId, connected_at: Timestamp) -> Self {
        Self {
            id,
            role: Role::Unknown,
            connected_at,
        }
    }

    /// Fix the role of this connection.
    ///
    /// The first announcement wins. Repeating it is a no-op, a different role
    /// is a [`HubError::RoleConflict`].
    ///
    /// Returns `true` when the role changed.
    pub fn assign_role(&mut self, role: Role) -> Result<bool, HubError> {
        match self.role {
            Role::Unknown => {
                self.role = role;
                Ok(true)
            }
            current if current == role => Ok(false),
            current => Err(HubError::RoleConflict {
                id: self.id.clone(),
                current,
                requested: role,
            }),
        }
    }
}
