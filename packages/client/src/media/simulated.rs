//! In-process media engine that fabricates negotiation blobs.
//!
//! No media is captured or transported. Descriptions and candidates are
//! small JSON objects, and the engine enforces the same ordering rules as a
//! real one (a candidate needs the remote description, an answer needs a
//! local offer).

use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{EngineEvent, MediaEngine, MediaError, TrackHandle, VideoSource};

/// Local candidates generated per peer connection.
const CANDIDATES_PER_PEER: usize = 2;

#[derive(Debug, Default)]
struct SimulatedPeer {
    local_description: bool,
    remote_description: bool,
    track: Option<TrackHandle>,
    candidates: Vec<Value>,
}

#[derive(Debug)]
pub struct SimulatedMediaEngine {
    cameras: Vec<String>,
    deny_camera: bool,
    deny_screen: bool,
    next_track: u64,
    live_tracks: HashMap<TrackHandle, VideoSource>,
    preview: Option<TrackHandle>,
    peers: HashMap<String, SimulatedPeer>,
    released: HashSet<TrackHandle>,
    events: VecDeque<EngineEvent>,
}

impl SimulatedMediaEngine {
    pub fn new(cameras: Vec<String>) -> Self {
        Self {
            cameras,
            deny_camera: false,
            deny_screen: false,
            next_track: 1,
            live_tracks: HashMap::new(),
            preview: None,
            peers: HashMap::new(),
            released: HashSet::new(),
            events: VecDeque::new(),
        }
    }

    /// Make every camera acquisition fail with a permission error.
    pub fn set_deny_camera(&mut self, deny: bool) {
        self.deny_camera = deny;
    }

    /// Make the screen picker behave as if the user cancelled it.
    pub fn set_deny_screen(&mut self, deny: bool) {
        self.deny_screen = deny;
    }

    pub fn cameras(&self) -> &[String] {
        &self.cameras
    }

    /// Simulate the user stopping a screen share from the system UI.
    ///
    /// Returns `false` when no screen share is live.
    pub fn end_screen_share(&mut self) -> bool {
        let Some(track) = self
            .live_tracks
            .iter()
            .find(|(_, source)| **source == VideoSource::Screen)
            .map(|(track, _)| *track)
        else {
            return false;
        };
        self.live_tracks.remove(&track);
        self.events.push_back(EngineEvent::TrackEnded { track });
        true
    }

    pub fn is_live(&self, track: TrackHandle) -> bool {
        self.live_tracks.contains_key(&track)
    }

    pub fn was_released(&self, track: TrackHandle) -> bool {
        self.released.contains(&track)
    }

    pub fn source_of(&self, track: TrackHandle) -> Option<&VideoSource> {
        self.live_tracks.get(&track)
    }

    pub fn preview(&self) -> Option<TrackHandle> {
        self.preview
    }

    pub fn has_peer(&self, peer: &str) -> bool {
        self.peers.contains_key(peer)
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Outbound track of `peer`, if any.
    pub fn peer_track(&self, peer: &str) -> Option<TrackHandle> {
        self.peers.get(peer).and_then(|p| p.track)
    }

    /// Remote candidates applied to `peer`, in order.
    pub fn applied_candidates(&self, peer: &str) -> Vec<Value> {
        self.peers
            .get(peer)
            .map(|p| p.candidates.clone())
            .unwrap_or_default()
    }

    fn queue_local_candidates(&mut self, peer: &str) {
        for index in 0..CANDIDATES_PER_PEER {
            self.events.push_back(EngineEvent::LocalCandidate {
                peer: peer.to_string(),
                candidate: json!({
                    "candidate": format!("candidate:{} 1 udp 2122260223 127.0.0.1 {} typ host", index, 50000 + index),
                    "sdpMid": "0",
                    "sdpMLineIndex": 0,
                }),
            });
        }
    }

    fn peer_mut(&mut self, peer: &str) -> Result<&mut SimulatedPeer, MediaError> {
        self.peers
            .get_mut(peer)
            .ok_or_else(|| MediaError::UnknownPeer(peer.to_string()))
    }
}

fn description_type(description: &Value) -> Option<&str> {
    description.get("type").and_then(Value::as_str)
}

#[async_trait]
impl MediaEngine for SimulatedMediaEngine {
    async fn acquire(&mut self, source: &VideoSource) -> Result<TrackHandle, MediaError> {
        match source {
            VideoSource::Camera(name) => {
                if self.deny_camera {
                    return Err(MediaError::PermissionDenied(source.to_string()));
                }
                if !self.cameras.contains(name) {
                    return Err(MediaError::DeviceNotFound(name.clone()));
                }
            }
            VideoSource::Screen => {
                if self.deny_screen {
                    return Err(MediaError::Cancelled);
                }
            }
        }

        let track = TrackHandle(self.next_track);
        self.next_track += 1;
        self.live_tracks.insert(track, source.clone());
        tracing::debug!("Acquired {} as {}", source, track);
        Ok(track)
    }

    async fn release(&mut self, track: TrackHandle) {
        self.live_tracks.remove(&track);
        self.released.insert(track);
        if self.preview == Some(track) {
            self.preview = None;
        }
    }

    async fn attach_preview(&mut self, track: TrackHandle) {
        self.preview = Some(track);
    }

    async fn create_offer(
        &mut self,
        peer: &str,
        track: Option<TrackHandle>,
    ) -> Result<Value, MediaError> {
        self.peers.insert(
            peer.to_string(),
            SimulatedPeer {
                local_description: true,
                track,
                ..SimulatedPeer::default()
            },
        );
        self.queue_local_candidates(peer);
        let video = track.map_or("none".to_string(), |t| t.to_string());
        Ok(json!({
            "type": "offer",
            "sdp": format!("v=0\r\ns=relaycast-sim\r\na=peer:{}\r\na=video:{}\r\n", peer, video),
        }))
    }

    async fn accept_offer(&mut self, peer: &str, offer: Value) -> Result<Value, MediaError> {
        if description_type(&offer) != Some("offer") {
            return Err(MediaError::Negotiation(format!(
                "expected an offer from '{}'",
                peer
            )));
        }
        self.peers.insert(
            peer.to_string(),
            SimulatedPeer {
                local_description: true,
                remote_description: true,
                ..SimulatedPeer::default()
            },
        );
        self.queue_local_candidates(peer);
        Ok(json!({
            "type": "answer",
            "sdp": format!("v=0\r\ns=relaycast-sim\r\na=peer:{}\r\na=recvonly\r\n", peer),
        }))
    }

    async fn apply_answer(&mut self, peer: &str, answer: Value) -> Result<(), MediaError> {
        let state = self.peer_mut(peer)?;
        if !state.local_description || description_type(&answer) != Some("answer") {
            return Err(MediaError::Negotiation(format!(
                "unexpected answer from '{}'",
                peer
            )));
        }
        state.remote_description = true;
        Ok(())
    }

    async fn add_candidate(&mut self, peer: &str, candidate: Value) -> Result<(), MediaError> {
        let state = self.peer_mut(peer)?;
        if !state.remote_description {
            return Err(MediaError::Negotiation(format!(
                "candidate for '{}' before remote description",
                peer
            )));
        }
        state.candidates.push(candidate);
        Ok(())
    }

    async fn replace_video(
        &mut self,
        peer: &str,
        track: Option<TrackHandle>,
    ) -> Result<(), MediaError> {
        self.peer_mut(peer)?.track = track;
        Ok(())
    }

    async fn close_peer(&mut self, peer: &str) {
        self.peers.remove(peer);
    }

    fn take_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain(..).collect()
    }
}
