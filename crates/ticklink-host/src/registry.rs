//! Server-side table of connected peers.
//!
//! A peer is present exactly while the server considers it connected. The
//! receive loop inserts, refreshes and removes entries while the sweep loop
//! evicts idle ones, so every operation takes the same lock and eviction
//! removes and reports a peer in one step.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use ticklink_core::Endpoint;

/// Concurrent map from endpoint to the last time it was heard from.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: Mutex<HashMap<Endpoint, Instant>>,
}

impl PeerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Endpoint, Instant>> {
        self.peers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts `endpoint` or refreshes its timestamp. Returns true if it was new.
    pub fn upsert(&self, endpoint: Endpoint, now: Instant) -> bool {
        let mut peers = self.lock();
        match peers.get_mut(&endpoint) {
            Some(last_seen) => {
                *last_seen = (*last_seen).max(now);
                false
            }
            None => {
                peers.insert(endpoint, now);
                true
            }
        }
    }

    /// Refreshes a registered peer. Unknown endpoints are left out; returns false for them.
    pub fn refresh(&self, endpoint: &Endpoint, now: Instant) -> bool {
        match self.lock().get_mut(endpoint) {
            Some(last_seen) => {
                *last_seen = (*last_seen).max(now);
                true
            }
            None => false,
        }
    }

    /// Removes a peer, returning when it was last seen.
    pub fn remove(&self, endpoint: &Endpoint) -> Option<Instant> {
        self.lock().remove(endpoint)
    }

    /// Removes and returns every peer silent for longer than `timeout`.
    pub fn evict_idle(&self, now: Instant, timeout: Duration) -> Vec<Endpoint> {
        let mut evicted = Vec::new();
        self.lock().retain(|endpoint, last_seen| {
            let idle = now.saturating_duration_since(*last_seen) > timeout;
            if idle {
                evicted.push(*endpoint);
            }
            !idle
        });
        evicted
    }

    /// Removes and returns every peer.
    pub fn drain(&self) -> Vec<Endpoint> {
        self.lock().drain().map(|(endpoint, _)| endpoint).collect()
    }

    /// Returns true if `endpoint` is registered.
    pub fn contains(&self, endpoint: &Endpoint) -> bool {
        self.lock().contains_key(endpoint)
    }

    /// When `endpoint` was last heard from.
    pub fn last_seen(&self, endpoint: &Endpoint) -> Option<Instant> {
        self.lock().get(endpoint).copied()
    }

    /// Snapshot of the registered endpoints, in no particular order.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.lock().keys().copied().collect()
    }

    /// Number of registered peers.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if no peer is registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
