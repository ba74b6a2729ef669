//! In-memory publish/subscribe fan-out for threat events.
//!
//! Delivery is best-effort, at-most-once per live subscriber, with no
//! replay: the bus retains nothing after a publish. A subscriber whose
//! channel is full or closed is removed from the registry as a side effect
//! of the failed publish — garbage collection on failure, invisible to the
//! publisher. Publishing snapshots the registry before delivering, so
//! concurrent subscribe/unsubscribe never races a mutate-while-iterating
//! hazard.

use crate::application::metrics::Metrics;
use crate::domain::event::ThreatEvent;
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

#[derive(Debug)]
struct BusInner {
    subscribers: DashMap<u64, mpsc::Sender<ThreatEvent>, RandomState>,
    next_id: AtomicU64,
    capacity: usize,
    metrics: Metrics,
}

/// Fan-out bus for threat events.
///
/// Clones share the same subscriber registry.
#[derive(Debug, Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    /// Create a bus whose subscribers each buffer up to `capacity`
    /// undelivered events before being dropped.
    pub fn new(capacity: usize, metrics: Metrics) -> Self {
        Self {
            inner: Arc::new(BusInner {
                subscribers: DashMap::with_hasher(RandomState::new()),
                next_id: AtomicU64::new(0),
                capacity,
                metrics,
            }),
        }
    }

    /// Register a new subscriber and hand back its receiving half.
    ///
    /// Dropping the subscription unregisters it promptly; no delivery is
    /// attempted after that.
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.inner.capacity);
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers.insert(id, sender);

        Subscription {
            id,
            receiver,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Remove a subscriber by id. Returns whether it was registered.
    pub fn unsubscribe(&self, id: u64) -> bool {
        self.inner.subscribers.remove(&id).is_some()
    }

    /// Deliver an event to every live subscriber.
    ///
    /// Returns the number of successful deliveries. One subscriber failing
    /// never affects the others or the publisher; the failed subscriber is
    /// unregistered instead.
    pub fn publish(&self, event: ThreatEvent) -> usize {
        self.inner.metrics.record_published();

        let targets: Vec<(u64, mpsc::Sender<ThreatEvent>)> = self
            .inner
            .subscribers
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let mut delivered = 0;
        let mut failed: Vec<u64> = Vec::new();

        for (id, sender) in targets {
            match sender.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(_) => failed.push(id),
            }
        }

        for id in failed {
            if self.inner.subscribers.remove(&id).is_some() {
                self.inner.metrics.record_subscriber_dropped();
                tracing::debug!(subscriber = id, "dropped subscriber after failed delivery");
            }
        }

        delivered
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }
}

/// A live subscriber's handle: the receiving half of its channel plus its
/// registration. The bus holds only the sending half, never the handle.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    receiver: mpsc::Receiver<ThreatEvent>,
    registry: Weak<BusInner>,
}

impl Subscription {
    /// This subscription's registry id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the next event. Resolves to `None` once the subscription
    /// has been unregistered and the buffer drained.
    pub async fn recv(&mut self) -> Option<ThreatEvent> {
        self.receiver.recv().await
    }

    /// Take the next buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<ThreatEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Explicitly disconnect. Events published after this returns are
    /// never delivered here.
    pub fn unsubscribe(self) {
        // Drop does the unregistration.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            inner.subscribers.remove(&self.id);
        }
    }
}
