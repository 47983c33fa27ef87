//! Outbound notifications delivered to participants.

use super::value_object::{ChatText, ConnectionId, SignalPayload};

/// Kind of a point-to-point negotiation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    Candidate,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::Candidate => "candidate",
        }
    }
}

/// Everything the relay can tell a participant.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Current number of open connections.
    ViewerCount(usize),
    /// Some connection announced itself as broadcaster.
    BroadcasterAnnounced,
    /// A viewer wants the broadcaster to send it an offer.
    WatchRequested { viewer: ConnectionId },
    /// Negotiation message, tagged with the sender so the recipient can reply.
    Signal {
        kind: SignalKind,
        from: ConnectionId,
        payload: SignalPayload,
    },
    /// The named peer's channel is gone.
    PeerDisconnected { peer: ConnectionId },
    /// Chat text, echoed to everyone including the sender.
    Chat(ChatText),
    /// The recipient's broadcaster was replaced by `broadcaster`.
    Takeover { broadcaster: ConnectionId },
}
