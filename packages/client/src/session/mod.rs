//! Peer session state machines.
//!
//! Sessions are sans-IO: they consume [`Input`]s and return the [`Action`]s
//! to perform. The [`crate::driver::Driver`] performs media actions against a
//! [`crate::media::MediaEngine`] and feeds the results back as
//! [`Input::Engine`] events, so every negotiation step is an explicit state
//! transition.

mod broadcaster;
mod candidates;
mod viewer;

use std::fmt;

use relaycast_server::infrastructure::dto::websocket::{ClientEvent, ServerEvent};
use serde_json::Value;

use crate::media::{EngineEvent, TrackHandle, VideoSource};

pub use broadcaster::BroadcasterSession;
pub use candidates::CandidateBuffer;
pub use viewer::ViewerSession;

/// Connection id of the remote side of a peer link.
pub type PeerId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Announced,
    Negotiating,
    Active,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Announced => "announced",
            SessionState::Negotiating => "negotiating",
            SessionState::Active => "active",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Local user requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Switch to the named camera, or to the next one in the list.
    SwitchCamera(Option<String>),
    ShareScreen,
    Exit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Relay(ServerEvent),
    Engine(EngineEvent),
    User(UserCommand),
}

/// Work requested by a session.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Send a frame to the relay.
    Send(ClientEvent),
    /// Acquire a local track; the result comes back tagged with `request`.
    Acquire { request: u64, source: VideoSource },
    Release(TrackHandle),
    AttachPreview(TrackHandle),
    CreateOffer {
        peer: PeerId,
        track: Option<TrackHandle>,
    },
    AcceptOffer { peer: PeerId, offer: Value },
    ApplyAnswer { peer: PeerId, answer: Value },
    AddCandidate { peer: PeerId, candidate: Value },
    /// Swap outbound video on an existing link without renegotiation.
    ReplaceVideo {
        peer: PeerId,
        track: Option<TrackHandle>,
    },
    ClosePeer(PeerId),
    /// Text for the local user.
    Status(String),
}

/// Common interface of the broadcaster and viewer sides.
pub trait Session: Send {
    /// Actions to run right after the channel opens.
    fn start(&mut self) -> Vec<Action>;

    fn handle(&mut self, input: Input) -> Vec<Action>;

    /// The channel closed; release everything.
    fn close(&mut self) -> Vec<Action>;

    fn state(&self) -> SessionState;

    /// One-line description for `/status`.
    fn summary(&self) -> String;
}
