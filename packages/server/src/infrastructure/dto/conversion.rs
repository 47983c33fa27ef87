//! Conversion logic between DTOs and domain types.

use relaycast_shared::time::timestamp_to_rfc3339;

use crate::domain::{Connection, HubSnapshot, Notification, SignalKind};
use crate::infrastructure::dto::{http, websocket::ServerEvent};

// ========================================
// Domain → DTO
// ========================================

impl From<Notification> for ServerEvent {
    fn from(notification: Notification) -> Self {
        match notification {
            Notification::ViewerCount(count) => ServerEvent::UpdateViewers(count),
            Notification::BroadcasterAnnounced => ServerEvent::Broadcaster,
            Notification::WatchRequested { viewer } => ServerEvent::Watcher(viewer.into_string()),
            Notification::Signal {
                kind,
                from,
                payload,
            } => {
                let from = from.into_string();
                let payload = payload.into_value();
                match kind {
                    SignalKind::Offer => ServerEvent::Offer(from, payload),
                    SignalKind::Answer => ServerEvent::Answer(from, payload),
                    SignalKind::Candidate => ServerEvent::Candidate(from, payload),
                }
            }
            Notification::PeerDisconnected { peer } => {
                ServerEvent::DisconnectPeer(peer.into_string())
            }
            Notification::Chat(text) => ServerEvent::NewMessage(text.into_string()),
            Notification::Takeover { broadcaster } => {
                ServerEvent::Takeover(broadcaster.into_string())
            }
        }
    }
}

impl From<Connection> for http::ConnectionInfo {
    fn from(connection: Connection) -> Self {
        Self {
            id: connection.id.into_string(),
            role: connection.role.as_str().to_string(),
            connected_at: timestamp_to_rfc3339(connection.connected_at.value()),
        }
    }
}

impl From<HubSnapshot> for http::StatusResponse {
    fn from(snapshot: HubSnapshot) -> Self {
        Self {
            viewers: snapshot.viewer_count(),
            broadcaster: snapshot.current_broadcaster.map(|id| id.into_string()),
            connections: snapshot.connections.into_iter().map(Into::into).collect(),
        }
    }
}
