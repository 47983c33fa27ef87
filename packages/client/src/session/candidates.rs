//! Per-peer buffering of remote candidates.
//!
//! Candidates may arrive before the remote description they belong to has
//! been applied. They are held per peer and released in arrival order once
//! the description is in place.

use std::collections::HashMap;

use serde_json::Value;

use super::PeerId;

/// Candidates kept per peer before further ones are dropped.
pub const MAX_BUFFERED_PER_PEER: usize = 128;

#[derive(Debug, Default)]
pub struct CandidateBuffer {
    pending: HashMap<PeerId, Vec<Value>>,
}

impl CandidateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a candidate. Returns `false` if the peer's buffer is full.
    pub fn push(&mut self, peer: &str, candidate: Value) -> bool {
        let queue = self.pending.entry(peer.to_string()).or_default();
        if queue.len() >= MAX_BUFFERED_PER_PEER {
            tracing::debug!("Candidate buffer for '{}' is full, dropping", peer);
            return false;
        }
        queue.push(candidate);
        true
    }

    /// Take every queued candidate of `peer`, oldest first.
    pub fn take(&mut self, peer: &str) -> Vec<Value> {
        self.pending.remove(peer).unwrap_or_default()
    }

    pub fn discard(&mut self, peer: &str) {
        self.pending.remove(peer);
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    #[cfg(test)]
    pub fn count_for(&self, peer: &str) -> usize {
        self.pending.get(peer).map_or(0, Vec::len)
    }
}
