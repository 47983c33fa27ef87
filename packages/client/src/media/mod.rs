//! Seam to the external real-time media engine.
//!
//! The session state machines never touch media directly. They emit commands
//! that a [`MediaEngine`] executes, and the engine's results come back to them
//! as [`EngineEvent`]s.

mod simulated;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use simulated::SimulatedMediaEngine;

/// Where outbound video comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VideoSource {
    Camera(String),
    Screen,
}

impl fmt::Display for VideoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoSource::Camera(name) => write!(f, "camera '{}'", name),
            VideoSource::Screen => write!(f, "screen share"),
        }
    }
}

/// Opaque handle of an acquired local track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackHandle(pub u64);

impl fmt::Display for TrackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "track#{}", self.0)
    }
}

/// Media engine failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("Permission denied for {0}")]
    PermissionDenied(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Cancelled by user")]
    Cancelled,

    #[error("Negotiation failed: {0}")]
    Negotiation(String),

    #[error("Unknown peer '{0}'")]
    UnknownPeer(String),
}

/// Results and spontaneous notifications coming out of the media engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Acquired {
        request: u64,
        track: TrackHandle,
    },
    AcquireFailed {
        request: u64,
        error: MediaError,
    },
    /// Local description for `peer` is set; `offer` goes to the relay.
    OfferCreated {
        peer: String,
        offer: Value,
    },
    /// Remote offer applied and local answer created.
    AnswerCreated {
        peer: String,
        answer: Value,
    },
    /// Remote answer applied.
    RemoteDescriptionApplied {
        peer: String,
    },
    LocalCandidate {
        peer: String,
        candidate: Value,
    },
    NegotiationFailed {
        peer: String,
        error: MediaError,
    },
    /// A track stopped outside of our control (e.g. the user ended a screen share).
    TrackEnded {
        track: TrackHandle,
    },
}

/// The external real-time media engine.
///
/// Methods that complete a negotiation step return its result; events that
/// the engine produces on its own (local candidates, ended tracks) are
/// collected with [`MediaEngine::take_events`].
#[async_trait]
pub trait MediaEngine: Send {
    async fn acquire(&mut self, source: &VideoSource) -> Result<TrackHandle, MediaError>;

    /// Stop a local track and free its device.
    async fn release(&mut self, track: TrackHandle);

    async fn attach_preview(&mut self, track: TrackHandle);

    /// Create a peer connection sending `track` and return its offer.
    async fn create_offer(
        &mut self,
        peer: &str,
        track: Option<TrackHandle>,
    ) -> Result<Value, MediaError>;

    /// Create a receiving peer connection from a remote offer and return the answer.
    async fn accept_offer(&mut self, peer: &str, offer: Value) -> Result<Value, MediaError>;

    async fn apply_answer(&mut self, peer: &str, answer: Value) -> Result<(), MediaError>;

    /// Requires the remote description of `peer` to be applied.
    async fn add_candidate(&mut self, peer: &str, candidate: Value) -> Result<(), MediaError>;

    /// Swap the outbound video of `peer` without renegotiating. `None` sends no video.
    async fn replace_video(
        &mut self,
        peer: &str,
        track: Option<TrackHandle>,
    ) -> Result<(), MediaError>;

    async fn close_peer(&mut self, peer: &str);

    /// Drain events produced since the last call.
    fn take_events(&mut self) -> Vec<EngineEvent>;
}
