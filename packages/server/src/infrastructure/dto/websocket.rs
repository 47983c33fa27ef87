//! WebSocket message DTOs.
//!
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`.
//! Multi-argument payloads are arrays in argument order, and negotiation
//! blobs are opaque JSON values carried through untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Participant → relay events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Announce this connection as the broadcaster.
    Broadcaster,
    /// Ask the current broadcaster for an offer.
    Watcher,
    /// `(targetId, description)`
    Offer(String, Value),
    /// `(targetId, description)`
    Answer(String, Value),
    /// `(targetId, candidate)`
    Candidate(String, Value),
    #[serde(rename = "send-message")]
    SendMessage(String),
}

/// Relay → participant events.
///
/// Directed negotiation messages carry the sender's id in the first slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    Broadcaster,
    /// Viewer id
    Watcher(String),
    Offer(String, Value),
    Answer(String, Value),
    Candidate(String, Value),
    /// Id of the peer that went away
    DisconnectPeer(String),
    #[serde(rename = "new-message")]
    NewMessage(String),
    #[serde(rename = "update-viewers")]
    UpdateViewers(usize),
    /// Id of the broadcaster that replaced the recipient's one
    Takeover(String),
}
