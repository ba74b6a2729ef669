//! Observability counters for the risk engine.
//!
//! All metrics use atomic operations for thread-safe updates and reads, and
//! can be queried at any time without touching detector state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking engine activity.
///
/// Clones share the same underlying counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    /// Request samples recorded by the rate tracker
    samples_recorded: AtomicU64,
    /// Threat events handed to the bus
    events_published: AtomicU64,
    /// Subscribers removed after a failed delivery
    subscribers_dropped: AtomicU64,
    /// Identities removed by LRU eviction
    identities_evicted: AtomicU64,
    /// Collaborator lookups that failed and fell back
    collaborator_failures: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                samples_recorded: AtomicU64::new(0),
                events_published: AtomicU64::new(0),
                subscribers_dropped: AtomicU64::new(0),
                identities_evicted: AtomicU64::new(0),
                collaborator_failures: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn record_sample(&self) {
        self.inner.samples_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_published(&self) {
        self.inner.events_published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_subscriber_dropped(&self) {
        self.inner
            .subscribers_dropped
            .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self) {
        self.inner
            .identities_evicted
            .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_collaborator_failure(&self) {
        self.inner
            .collaborator_failures
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn samples_recorded(&self) -> u64 {
        self.inner.samples_recorded.load(Ordering::Relaxed)
    }

    pub fn events_published(&self) -> u64 {
        self.inner.events_published.load(Ordering::Relaxed)
    }

    pub fn subscribers_dropped(&self) -> u64 {
        self.inner.subscribers_dropped.load(Ordering::Relaxed)
    }

    pub fn identities_evicted(&self) -> u64 {
        self.inner.identities_evicted.load(Ordering::Relaxed)
    }

    pub fn collaborator_failures(&self) -> u64 {
        self.inner.collaborator_failures.load(Ordering::Relaxed)
    }

    /// Get a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            samples_recorded: self.samples_recorded(),
            events_published: self.events_published(),
            subscribers_dropped: self.subscribers_dropped(),
            identities_evicted: self.identities_evicted(),
            collaborator_failures: self.collaborator_failures(),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.inner.samples_recorded.store(0, Ordering::Relaxed);
        self.inner.events_published.store(0, Ordering::Relaxed);
        self.inner.subscribers_dropped.store(0, Ordering::Relaxed);
        self.inner.identities_evicted.store(0, Ordering::Relaxed);
        self.inner.collaborator_failures.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub samples_recorded: u64,
    pub events_published: u64,
    pub subscribers_dropped: u64,
    pub identities_evicted: u64,
    pub collaborator_failures: u64,
}
