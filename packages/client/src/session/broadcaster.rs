//! Broadcaster side of the peer session.
//!
//! One broadcaster serves many viewers, each over its own [`PeerLink`]
//! (`negotiating → active → closed`). Outbound video can be replaced on every
//! link at once without renegotiation.

use std::collections::BTreeMap;

use relaycast_server::infrastructure::dto::websocket::{ClientEvent, ServerEvent};

use crate::media::{EngineEvent, MediaError, TrackHandle, VideoSource};

use super::{Action, CandidateBuffer, Input, PeerId, Session, SessionState, UserCommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AcquirePurpose {
    /// First local media after announcing
    Initial,
    /// User asked for another source
    Replace,
    /// Screen share ended, back to the default camera
    Fallback,
}

#[derive(Debug, Clone)]
struct PendingAcquire {
    request: u64,
    source: VideoSource,
    purpose: AcquirePurpose,
}

/// Negotiation sub-session with one viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerLink {
    pub state: SessionState,
    remote_applied: bool,
}

impl PeerLink {
    fn new() -> Self {
        Self {
            state: SessionState::Negotiating,
            remote_applied: false,
        }
    }
}

#[derive(Debug)]
pub struct BroadcasterSession {
    state: SessionState,
    cameras: Vec<String>,
    camera_index: usize,
    current: Option<(TrackHandle, VideoSource)>,
    media_ready: bool,
    pending: Option<PendingAcquire>,
    next_request: u64,
    /// Viewers that asked to watch before the initial media was ready
    parked: Vec<PeerId>,
    links: BTreeMap<PeerId, PeerLink>,
    candidates: CandidateBuffer,
}

impl BroadcasterSession {
    /// `cameras[0]` is the default camera.
    pub fn new(cameras: Vec<String>) -> Self {
        Self {
            state: SessionState::Idle,
            cameras,
            camera_index: 0,
            current: None,
            media_ready: false,
            pending: None,
            next_request: 1,
            parked: Vec::new(),
            links: BTreeMap::new(),
            candidates: CandidateBuffer::new(),
        }
    }

    /// Viewers whose link is active, in id order.
    pub fn active_peers(&self) -> Vec<PeerId> {
        self.links
            .iter()
            .filter(|(_, link)| link.state == SessionState::Active)
            .map(|(peer, _)| peer.clone())
            .collect()
    }

    pub fn current_source(&self) -> Option<&VideoSource> {
        self.current.as_ref().map(|(_, source)| source)
    }

    pub fn current_track(&self) -> Option<TrackHandle> {
        self.current.as_ref().map(|(track, _)| *track)
    }

    fn default_camera(&self) -> VideoSource {
        VideoSource::Camera(
            self.cameras
                .first()
                .cloned()
                .unwrap_or_else(|| "default".to_string()),
        )
    }

    fn begin_acquire(&mut self, source: VideoSource, purpose: AcquirePurpose) -> Action {
        let request = self.next_request;
        self.next_request += 1;
        self.pending = Some(PendingAcquire {
            request,
            source: source.clone(),
            purpose,
        });
        Action::Acquire { request, source }
    }

    fn open_link(&mut self, peer: PeerId) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.links.remove(&peer).is_some() {
            self.candidates.discard(&peer);
            actions.push(Action::ClosePeer(peer.clone()));
        }
        self.links.insert(peer.clone(), PeerLink::new());
        actions.push(Action::Status(format!("Negotiating with viewer {}", peer)));
        actions.push(Action::CreateOffer {
            peer,
            track: self.current_track(),
        });
        actions
    }

    /// Negotiating links are included so their pending offer never keeps a
    /// released track.
    fn replace_on_links(&self, track: Option<TrackHandle>) -> Vec<Action> {
        self.links
            .keys()
            .map(|peer| Action::ReplaceVideo {
                peer: peer.clone(),
                track,
            })
            .collect()
    }

    fn close_links(&mut self) -> Vec<Action> {
        self.candidates.clear();
        std::mem::take(&mut self.links)
            .into_keys()
            .map(Action::ClosePeer)
            .collect()
    }

    fn on_relay(&mut self, event: ServerEvent) -> Vec<Action> {
        match event {
            ServerEvent::Watcher(viewer) => {
                if self.media_ready {
                    return self.open_link(viewer);
                }
                if self.parked.contains(&viewer) {
                    return Vec::new();
                }
                self.parked.push(viewer.clone());
                vec![Action::Status(format!(
                    "Viewer {} is waiting for local media",
                    viewer
                ))]
            }
            ServerEvent::Answer(viewer, answer) => match self.links.get(&viewer) {
                Some(link) if link.state == SessionState::Negotiating && !link.remote_applied => {
                    vec![Action::ApplyAnswer {
                        peer: viewer,
                        answer,
                    }]
                }
                _ => {
                    tracing::debug!("Ignored answer from '{}'", viewer);
                    Vec::new()
                }
            },
            ServerEvent::Candidate(viewer, candidate) => match self.links.get(&viewer) {
                Some(link) if link.remote_applied => vec![Action::AddCandidate {
                    peer: viewer,
                    candidate,
                }],
                Some(_) => {
                    self.candidates.push(&viewer, candidate);
                    Vec::new()
                }
                None => {
                    tracing::debug!("Ignored candidate from unknown viewer '{}'", viewer);
                    Vec::new()
                }
            },
            ServerEvent::DisconnectPeer(viewer) => {
                self.parked.retain(|peer| *peer != viewer);
                if self.links.remove(&viewer).is_none() {
                    return Vec::new();
                }
                self.candidates.discard(&viewer);
                vec![
                    Action::ClosePeer(viewer.clone()),
                    Action::Status(format!("Viewer {} left", viewer)),
                ]
            }
            ServerEvent::Takeover(replacement) => {
                self.parked.clear();
                let mut actions = self.close_links();
                actions.push(Action::Status(format!(
                    "Broadcast taken over by {}",
                    replacement
                )));
                actions
            }
            ServerEvent::Broadcaster => vec![Action::Status(
                "Another participant announced itself as broadcaster".to_string(),
            )],
            ServerEvent::Offer(..)
            | ServerEvent::NewMessage(_)
            | ServerEvent::UpdateViewers(_) => Vec::new(),
        }
    }

    fn on_acquired(&mut self, pending: PendingAcquire, track: TrackHandle) -> Vec<Action> {
        let mut actions = Vec::new();
        if let Some((old, _)) = self.current.take() {
            actions.push(Action::Release(old));
        }
        if let VideoSource::Camera(name) = &pending.source
            && let Some(index) = self.cameras.iter().position(|camera| camera == name)
        {
            self.camera_index = index;
        }
        self.current = Some((track, pending.source.clone()));
        actions.push(Action::AttachPreview(track));

        match pending.purpose {
            AcquirePurpose::Initial => {
                self.media_ready = true;
                actions.push(Action::Status(format!("Live on {}", pending.source)));
                for viewer in std::mem::take(&mut self.parked) {
                    actions.extend(self.open_link(viewer));
                }
            }
            AcquirePurpose::Replace | AcquirePurpose::Fallback => {
                actions.extend(self.replace_on_links(Some(track)));
                actions.push(Action::Status(format!(
                    "Outbound video switched to {}",
                    pending.source
                )));
            }
        }
        actions
    }

    fn on_acquire_failed(&mut self, pending: PendingAcquire, error: MediaError) -> Vec<Action> {
        match pending.purpose {
            AcquirePurpose::Initial => {
                self.parked.clear();
                self.state = SessionState::Closed;
                vec![Action::Status(format!(
                    "Could not acquire {}: {}. Broadcast stopped.",
                    pending.source, error
                ))]
            }
            AcquirePurpose::Replace if self.current.is_none() => {
                // The previous source ended while this request was pending
                let fallback = self.default_camera();
                if pending.source == fallback {
                    return vec![Action::Status(format!(
                        "Could not switch to {}: {}. Sending no video.",
                        pending.source, error
                    ))];
                }
                vec![
                    Action::Status(format!(
                        "Could not switch to {}: {}. Falling back to {}.",
                        pending.source, error, fallback
                    )),
                    self.begin_acquire(fallback, AcquirePurpose::Fallback),
                ]
            }
            AcquirePurpose::Replace => {
                let keeping = self
                    .current_source()
                    .map_or("no video".to_string(), |source| source.to_string());
                vec![Action::Status(format!(
                    "Could not switch to {}: {}. Keeping {}.",
                    pending.source, error, keeping
                ))]
            }
            AcquirePurpose::Fallback => vec![Action::Status(format!(
                "Could not fall back to {}: {}. Sending no video.",
                pending.source, error
            ))],
        }
    }

    fn on_engine(&mut self, event: EngineEvent) -> Vec<Action> {
        match event {
            EngineEvent::Acquired { request, track } => {
                match self.pending.take_if(|p| p.request == request) {
                    Some(pending) => self.on_acquired(pending, track),
                    None => vec![Action::Release(track)],
                }
            }
            EngineEvent::AcquireFailed { request, error } => {
                match self.pending.take_if(|p| p.request == request) {
                    Some(pending) => self.on_acquire_failed(pending, error),
                    None => Vec::new(),
                }
            }
            EngineEvent::OfferCreated { peer, offer } => match self.links.get(&peer) {
                Some(link) if link.state == SessionState::Negotiating => {
                    vec![Action::Send(ClientEvent::Offer(peer, offer))]
                }
                _ => Vec::new(),
            },
            EngineEvent::RemoteDescriptionApplied { peer } => {
                let Some(link) = self.links.get_mut(&peer) else {
                    return Vec::new();
                };
                link.remote_applied = true;
                link.state = SessionState::Active;
                let mut actions: Vec<Action> = self
                    .candidates
                    .take(&peer)
                    .into_iter()
                    .map(|candidate| Action::AddCandidate {
                        peer: peer.clone(),
                        candidate,
                    })
                    .collect();
                actions.push(Action::Status(format!("Viewer {} connected", peer)));
                actions
            }
            EngineEvent::LocalCandidate { peer, candidate } => {
                if self.links.contains_key(&peer) {
                    vec![Action::Send(ClientEvent::Candidate(peer, candidate))]
                } else {
                    Vec::new()
                }
            }
            EngineEvent::NegotiationFailed { peer, error } => {
                if self.links.remove(&peer).is_none() {
                    return Vec::new();
                }
                self.candidates.discard(&peer);
                vec![
                    Action::ClosePeer(peer.clone()),
                    Action::Status(format!("Negotiation with {} failed: {}", peer, error)),
                ]
            }
            EngineEvent::TrackEnded { track } => {
                if self.current_track() != Some(track) {
                    return Vec::new();
                }
                let Some((_, source)) = self.current.take() else {
                    return Vec::new();
                };
                let mut actions = vec![Action::Release(track)];
                actions.extend(self.replace_on_links(None));
                if let Some(pending) = &self.pending {
                    actions.push(Action::Status(format!(
                        "{} ended while switching to {}",
                        source, pending.source
                    )));
                } else if source == VideoSource::Screen {
                    let fallback = self.default_camera();
                    actions.push(Action::Status(format!(
                        "Screen share ended, falling back to {}",
                        fallback
                    )));
                    actions.push(self.begin_acquire(fallback, AcquirePurpose::Fallback));
                } else {
                    actions.push(Action::Status(format!("{} stopped", source)));
                }
                actions
            }
            EngineEvent::AnswerCreated { .. } => Vec::new(),
        }
    }

    fn on_user(&mut self, command: UserCommand) -> Vec<Action> {
        let source = match command {
            UserCommand::Exit => return self.close(),
            UserCommand::ShareScreen => VideoSource::Screen,
            UserCommand::SwitchCamera(Some(name)) => VideoSource::Camera(name),
            UserCommand::SwitchCamera(None) => {
                if self.cameras.len() < 2 {
                    return vec![Action::Status("No other camera to switch to".to_string())];
                }
                let next = (self.camera_index + 1) % self.cameras.len();
                VideoSource::Camera(self.cameras[next].clone())
            }
        };

        if !self.media_ready {
            return vec![Action::Status("Local media is not ready yet".to_string())];
        }
        if let Some(pending) = &self.pending {
            return vec![Action::Status(format!(
                "Still acquiring {}, try again later",
                pending.source
            ))];
        }
        vec![self.begin_acquire(source, AcquirePurpose::Replace)]
    }
}

impl Session for BroadcasterSession {
    fn start(&mut self) -> Vec<Action> {
        if self.state != SessionState::Idle {
            return Vec::new();
        }
        self.state = SessionState::Announced;
        let source = self.default_camera();
        vec![
            Action::Send(ClientEvent::Broadcaster),
            Action::Status(format!("Announced as broadcaster, acquiring {}", source)),
            self.begin_acquire(source, AcquirePurpose::Initial),
        ]
    }

    fn handle(&mut self, input: Input) -> Vec<Action> {
        if self.state == SessionState::Closed {
            // A track that arrives after closing must still be freed
            return match input {
                Input::Engine(EngineEvent::Acquired { track, .. }) => vec![Action::Release(track)],
                _ => Vec::new(),
            };
        }
        match input {
            Input::Relay(event) => self.on_relay(event),
            Input::Engine(event) => self.on_engine(event),
            Input::User(command) => self.on_user(command),
        }
    }

    fn close(&mut self) -> Vec<Action> {
        if self.state == SessionState::Closed {
            return Vec::new();
        }
        let mut actions = self.close_links();
        if let Some((track, _)) = self.current.take() {
            actions.push(Action::Release(track));
        }
        self.pending = None;
        self.parked.clear();
        self.state = SessionState::Closed;
        actions.push(Action::Status("Broadcast closed".to_string()));
        actions
    }

    fn state(&self) -> SessionState {
        self.state
    }

    fn summary(&self) -> String {
        let video = self
            .current_source()
            .map_or("no video".to_string(), |source| source.to_string());
        let active = self.active_peers().len();
        format!(
            "broadcaster {} on {}: {} active, {} negotiating, {} waiting",
            self.state,
            video,
            active,
            self.links.len() - active,
            self.parked.len()
        )
    }
}
