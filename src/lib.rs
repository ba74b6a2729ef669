//! # riskgate
//!
//! Real-time risk and anomaly engine for security platforms: it ingests
//! discrete signals — inbound requests, login events, financial-document
//! extractions — and turns them into numeric risk scores with thresholds,
//! fans high-severity findings out to live subscribers, and gates all
//! mutating operations behind a global read-only lockdown mode.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use riskgate::{InMemoryLoginHistory, InMemoryVendorLedger, RiskEngine};
//! use std::sync::Arc;
//!
//! let engine = RiskEngine::builder(
//!     Arc::new(InMemoryVendorLedger::new()),
//!     Arc::new(InMemoryLoginHistory::new()),
//! )
//! .build()
//! .unwrap();
//!
//! // Live subscribers receive every high-severity finding.
//! let mut alerts = engine.subscribe();
//!
//! // Score an inbound request by source identity.
//! let assessment = engine.assess_request("203.0.113.9");
//! if assessment.should_block {
//!     // refuse the request, alert already fanned out
//! }
//! ```
//!
//! ## Detectors
//!
//! - **Rate windows** — per-identity sliding time windows over request
//!   timestamps. With the default policy (20 calls per second), the score
//!   is `(count / 20) * 50`: exactly at the threshold scores 50, anything
//!   strictly above blocks and publishes a `RATE_ANOMALY` event.
//! - **Impossible travel** — great-circle distance between two consecutive
//!   login locations divided by elapsed time; implied speeds strictly above
//!   500 km/h (configurable) indicate likely credential compromise and
//!   publish an `IMPOSSIBLE_TRAVEL` event.
//! - **Fraud heuristics** — fixed-order scoring of document extractions:
//!   additive content rules (pressure language, brand/domain mismatch,
//!   payment-change language) plus relational floor overrides against the
//!   vendor ledger, with a conservative cold-start policy for unknown
//!   vendors. Suspicious verdicts publish a `FRAUD_ANOMALY` event.
//!
//! ## Concurrency
//!
//! Per-identity window state lives in sharded storage whose entry locking
//! serializes same-identity samples (arrival order is preserved per key)
//! while different identities never contend. The subscriber registry and
//! the lockdown flag are the only other shared state; none of the three
//! ever locks another while holding its own lock.
//!
//! ## Collaborator failures
//!
//! Vendor-ledger and login-history lookups run behind a fail-open circuit
//! breaker: an unreachable store degrades to the cold-start / no-prior-
//! record branch, never into a failed assessment.
//!
//! ## Lockdown
//!
//! [`AccessGate`] is a process-wide two-state switch. While locked, every
//! mutating entry point returns the uniform [`LockdownActive`] refusal, and
//! the toggle best-effort propagates to the backing store's own
//! write-protection switch as defense in depth.

// Domain layer - pure detection logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    event::{Severity, ThreatEvent, ThreatKind},
    fraud::{
        DocumentExtraction, FraudHeuristicEngine, FraudPolicy, RiskVerdict, VendorRecord,
    },
    score::{clamp_score, haversine_km, EARTH_RADIUS_KM},
    travel::{LoginEvent, TravelAnomalyDetector, TravelPolicy, TravelVerdict},
    window::{RatePolicy, RateWindow, RATE_BLOCK_THRESHOLD},
};

pub use application::{
    breaker::{BreakerConfig, CircuitBreaker, CircuitState},
    engine::{BuildError, EngineStatus, RequestAssessment, RiskEngine, RiskEngineBuilder},
    gate::{AccessGate, LockdownActive},
    metrics::{Metrics, MetricsSnapshot},
    ports::{Clock, LoginHistoryStore, Storage, StoreUnavailable, VendorLedger, WriteProtection},
    tracker::RateWindowTracker,
};

pub use infrastructure::{
    bus::{EventBus, Subscription},
    clock::SystemClock,
    mocks::{InMemoryLoginHistory, InMemoryVendorLedger, MockClock, MockWriteProtection},
    storage::ShardedStorage,
};
