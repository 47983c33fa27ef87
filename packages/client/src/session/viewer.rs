//! Viewer side of the peer session: one link to the current broadcaster.

use relaycast_server::infrastructure::dto::websocket::{ClientEvent, ServerEvent};

use crate::media::EngineEvent;

use super::{Action, CandidateBuffer, Input, PeerId, Session, SessionState, UserCommand};

#[derive(Debug, Clone)]
struct ViewerLink {
    peer: PeerId,
    remote_applied: bool,
}

#[derive(Debug)]
pub struct ViewerSession {
    state: SessionState,
    link: Option<ViewerLink>,
    candidates: CandidateBuffer,
}

impl Default for ViewerSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewerSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            link: None,
            candidates: CandidateBuffer::new(),
        }
    }

    /// Id of the broadcaster this viewer is linked to, if any.
    pub fn broadcaster(&self) -> Option<&str> {
        self.link.as_ref().map(|link| link.peer.as_str())
    }

    fn is_linked_to(&self, peer: &str) -> bool {
        self.broadcaster() == Some(peer)
    }

    fn drop_link(&mut self) -> Vec<Action> {
        match self.link.take() {
            Some(link) => {
                self.candidates.discard(&link.peer);
                vec![Action::ClosePeer(link.peer)]
            }
            None => Vec::new(),
        }
    }

    fn on_relay(&mut self, event: ServerEvent) -> Vec<Action> {
        match event {
            ServerEvent::Broadcaster => {
                if self.state != SessionState::Active {
                    self.state = SessionState::Negotiating;
                }
                vec![
                    Action::Send(ClientEvent::Watcher),
                    Action::Status("Broadcaster is live, requesting the stream".to_string()),
                ]
            }
            ServerEvent::Offer(from, offer) => {
                let mut actions = Vec::new();
                if let Some(old) = self.link.take() {
                    if old.peer != from {
                        self.candidates.discard(&old.peer);
                    }
                    actions.push(Action::ClosePeer(old.peer));
                }
                self.link = Some(ViewerLink {
                    peer: from.clone(),
                    remote_applied: false,
                });
                self.state = SessionState::Negotiating;
                actions.push(Action::AcceptOffer { peer: from, offer });
                actions
            }
            ServerEvent::Candidate(from, candidate) => match &self.link {
                Some(link) if link.peer == from && link.remote_applied => {
                    vec![Action::AddCandidate {
                        peer: from,
                        candidate,
                    }]
                }
                _ => {
                    // May precede the offer it belongs to
                    self.candidates.push(&from, candidate);
                    Vec::new()
                }
            },
            ServerEvent::DisconnectPeer(peer) => {
                self.candidates.discard(&peer);
                if !self.is_linked_to(&peer) {
                    return Vec::new();
                }
                let mut actions = self.drop_link();
                self.state = SessionState::Idle;
                actions.push(Action::Status("Broadcast ended".to_string()));
                actions
            }
            ServerEvent::Takeover(replacement) => {
                let mut actions = self.drop_link();
                self.candidates.clear();
                self.state = SessionState::Idle;
                actions.push(Action::Status(format!(
                    "Broadcast taken over by {}, waiting for its announcement",
                    replacement
                )));
                actions
            }
            ServerEvent::Watcher(_)
            | ServerEvent::Answer(..)
            | ServerEvent::NewMessage(_)
            | ServerEvent::UpdateViewers(_) => Vec::new(),
        }
    }

    fn on_engine(&mut self, event: EngineEvent) -> Vec<Action> {
        match event {
            EngineEvent::AnswerCreated { peer, answer } => {
                let Some(link) = self.link.as_mut().filter(|link| link.peer == peer) else {
                    return Vec::new();
                };
                link.remote_applied = true;
                self.state = SessionState::Active;
                let mut actions = vec![Action::Send(ClientEvent::Answer(peer.clone(), answer))];
                actions.extend(self.candidates.take(&peer).into_iter().map(|candidate| {
                    Action::AddCandidate {
                        peer: peer.clone(),
                        candidate,
                    }
                }));
                actions.push(Action::Status(format!("Watching broadcast from {}", peer)));
                actions
            }
            EngineEvent::LocalCandidate { peer, candidate } => {
                if self.is_linked_to(&peer) {
                    vec![Action::Send(ClientEvent::Candidate(peer, candidate))]
                } else {
                    Vec::new()
                }
            }
            EngineEvent::NegotiationFailed { peer, error } => {
                if !self.is_linked_to(&peer) {
                    return Vec::new();
                }
                let mut actions = self.drop_link();
                self.state = SessionState::Idle;
                actions.push(Action::Status(format!(
                    "Negotiation with {} failed: {}",
                    peer, error
                )));
                actions
            }
            EngineEvent::Acquired { track, .. } => vec![Action::Release(track)],
            EngineEvent::AcquireFailed { .. }
            | EngineEvent::OfferCreated { .. }
            | EngineEvent::RemoteDescriptionApplied { .. }
            | EngineEvent::TrackEnded { .. } => Vec::new(),
        }
    }
}

impl Session for ViewerSession {
    fn start(&mut self) -> Vec<Action> {
        if self.state != SessionState::Idle || self.link.is_some() {
            return Vec::new();
        }
        self.state = SessionState::Negotiating;
        vec![
            Action::Send(ClientEvent::Watcher),
            Action::Status("Waiting for a broadcaster".to_string()),
        ]
    }

    fn handle(&mut self, input: Input) -> Vec<Action> {
        if self.state == SessionState::Closed {
            return Vec::new();
        }
        match input {
            Input::Relay(event) => self.on_relay(event),
            Input::Engine(event) => self.on_engine(event),
            Input::User(UserCommand::Exit) => self.close(),
            Input::User(_) => vec![Action::Status(
                "Only the broadcaster can change the outbound video".to_string(),
            )],
        }
    }

    fn close(&mut self) -> Vec<Action> {
        if self.state == SessionState::Closed {
            return Vec::new();
        }
        let mut actions = self.drop_link();
        self.candidates.clear();
        self.state = SessionState::Closed;
        actions.push(Action::Status("Stopped watching".to_string()));
        actions
    }

    fn state(&self) -> SessionState {
        self.state
    }

    fn summary(&self) -> String {
        match self.broadcaster() {
            Some(peer) => format!("viewer {} with broadcaster {}", self.state, peer),
            None => format!("viewer {}, no broadcaster", self.state),
        }
    }
}
