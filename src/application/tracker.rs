//! Per-identity rate tracking over concurrent keyed storage.
//!
//! The tracker owns one [`RateWindow`] per source identity, created lazily
//! on the first sample. Storage entry locking serializes concurrent samples
//! for the same identity, so each identity's evaluations observe wall-clock
//! arrival order; different identities never contend.
//!
//! Under rotating source addresses an unbounded registry is a slow memory
//! leak, so the tracker enforces a bound with least-recently-seen
//! eviction.

use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, Storage};
use crate::domain::window::{RatePolicy, RateWindow};
use crate::infrastructure::eviction::{select_lru_victim, EvictionCandidate};
use std::sync::Arc;

/// Tracks request rates per identity and produces threat scores.
#[derive(Debug, Clone)]
pub struct RateWindowTracker<S>
where
    S: Storage<String, RateWindow> + Clone,
{
    storage: S,
    clock: Arc<dyn Clock>,
    policy: RatePolicy,
    max_identities: usize,
    metrics: Metrics,
}

impl<S> RateWindowTracker<S>
where
    S: Storage<String, RateWindow> + Clone,
{
    /// Create a tracker.
    ///
    /// # Arguments
    /// * `storage` - Concurrent keyed storage for the per-identity windows
    /// * `clock` - Time source (mockable in tests)
    /// * `policy` - Window length and threshold count
    /// * `max_identities` - Bound on tracked identities before LRU eviction
    /// * `metrics` - Shared engine counters
    pub fn new(
        storage: S,
        clock: Arc<dyn Clock>,
        policy: RatePolicy,
        max_identities: usize,
        metrics: Metrics,
    ) -> Self {
        Self {
            storage,
            clock,
            policy,
            max_identities,
            metrics,
        }
    }

    /// Record a sample for `identity` and return its threat score.
    ///
    /// Appends "now" to the identity's window, prunes everything older than
    /// the trailing window, and scores the remaining count. The entry lock
    /// is held for the whole mutation, so same-identity calls are
    /// serialized and never double-count.
    pub fn record_and_score(&self, identity: &str) -> f64 {
        let now = self.clock.now();
        let window = self.policy.window;

        let count = self.storage.with_entry_mut(
            identity.to_owned(),
            || RateWindow::new(now),
            |state| state.record(now, window),
        );

        self.metrics.record_sample();
        self.evict_if_over_capacity(identity);

        self.policy.threat_score(count)
    }

    /// Number of identities currently tracked.
    pub fn identity_count(&self) -> usize {
        self.storage.len()
    }

    /// The tracker's rate policy.
    pub fn policy(&self) -> &RatePolicy {
        &self.policy
    }

    /// Drop the least recently seen identity once the registry exceeds its
    /// bound. Runs after the entry lock is released; the identity just
    /// touched is never the victim.
    fn evict_if_over_capacity(&self, just_touched: &str) {
        if self.storage.len() <= self.max_identities {
            return;
        }

        let mut candidates = Vec::with_capacity(self.storage.len());
        self.storage.for_each(|key, state| {
            if key != just_touched {
                candidates.push(EvictionCandidate {
                    key: key.clone(),
                    last_seen: state.last_seen(),
                });
            }
        });

        if let Some(victim) = select_lru_victim(&candidates) {
            if self.storage.remove(&victim) {
                self.metrics.record_eviction();
                tracing::debug!(identity = %victim, "evicted least recently seen identity");
            }
        }
    }
}
