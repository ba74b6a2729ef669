//! Least-recently-seen victim selection for the identity registry.

use std::time::Instant;

/// Snapshot of one registry entry considered for eviction. Values are
/// owned copies so selection never holds a concurrent-map guard.
#[derive(Debug, Clone)]
pub struct EvictionCandidate<K> {
    /// The registry key.
    pub key: K,
    /// When the entry was last touched.
    pub last_seen: Instant,
}

/// Pick the least recently seen candidate, if any.
pub fn select_lru_victim<K: Clone>(candidates: &[EvictionCandidate<K>]) -> Option<K> {
    candidates
        .iter()
        .min_by_key(|candidate| candidate.last_seen)
        .map(|candidate| candidate.key.clone())
}
