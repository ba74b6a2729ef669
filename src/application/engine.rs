//! The risk engine facade.
//!
//! Wires the detectors, the event bus, the access gate and the collaborator
//! ports together behind the three assessment entry points the calling
//! layer uses. Built through [`RiskEngineBuilder`], which validates
//! configuration up front: invalid thresholds are a startup failure, never
//! a runtime surprise.

use crate::application::breaker::{BreakerConfig, CircuitBreaker};
use crate::application::gate::{AccessGate, LockdownActive};
use crate::application::metrics::Metrics;
use crate::application::ports::{
    Clock, LoginHistoryStore, StoreUnavailable, VendorLedger, WriteProtection,
};
use crate::application::tracker::RateWindowTracker;
use crate::domain::event::{Severity, ThreatEvent, ThreatKind};
use crate::domain::fraud::{DocumentExtraction, FraudHeuristicEngine, FraudPolicy, RiskVerdict};
use crate::domain::travel::{LoginEvent, TravelAnomalyDetector, TravelPolicy, TravelVerdict};
use crate::domain::window::{RatePolicy, RateWindow, RATE_BLOCK_THRESHOLD};
use crate::infrastructure::bus::{EventBus, Subscription};
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::storage::ShardedStorage;
use serde_json::json;
use std::sync::Arc;

type WindowStorage = Arc<ShardedStorage<String, RateWindow>>;

/// Error returned when building a [`RiskEngine`] fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Rate window duration must be greater than zero
    ZeroRateWindow,
    /// Rate threshold count must be greater than zero
    ZeroThresholdCount,
    /// Travel speed threshold must be a positive number
    NonPositiveTravelSpeed,
    /// Fraud suspicious threshold must not exceed 100
    SuspiciousThresholdOutOfRange,
    /// Identity bound must be greater than zero
    ZeroMaxIdentities,
    /// Subscriber channel capacity must be greater than zero
    ZeroSubscriberCapacity,
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::ZeroRateWindow => write!(f, "rate window must be greater than 0"),
            BuildError::ZeroThresholdCount => {
                write!(f, "rate threshold count must be greater than 0")
            }
            BuildError::NonPositiveTravelSpeed => {
                write!(f, "max travel speed must be a positive number of km/h")
            }
            BuildError::SuspiciousThresholdOutOfRange => {
                write!(f, "fraud suspicious threshold must be at most 100")
            }
            BuildError::ZeroMaxIdentities => {
                write!(f, "max tracked identities must be greater than 0")
            }
            BuildError::ZeroSubscriberCapacity => {
                write!(f, "subscriber channel capacity must be greater than 0")
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// Outcome of a single inbound-request assessment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestAssessment {
    /// `(count / threshold_count) * 50.0`, unbounded above.
    pub threat_score: f64,
    /// Strictly more than `threshold_count` calls landed in the window.
    pub should_block: bool,
}

/// Introspection snapshot for health surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStatus {
    pub lockdown_active: bool,
    pub tracked_identities: usize,
    pub subscriber_count: usize,
}

/// Real-time risk and anomaly engine.
///
/// One instance per process is typical, but nothing here is a hidden
/// global: independent instances (with their own gates and buses) coexist
/// freely, which the tests rely on.
pub struct RiskEngine {
    tracker: RateWindowTracker<WindowStorage>,
    travel: TravelAnomalyDetector,
    fraud: FraudHeuristicEngine,
    bus: EventBus,
    gate: Arc<AccessGate>,
    vendors: Arc<dyn VendorLedger>,
    logins: Arc<dyn LoginHistoryStore>,
    breaker: Arc<CircuitBreaker>,
    metrics: Metrics,
}

impl RiskEngine {
    /// Start building an engine around the two read collaborators.
    pub fn builder(
        vendors: Arc<dyn VendorLedger>,
        logins: Arc<dyn LoginHistoryStore>,
    ) -> RiskEngineBuilder {
        RiskEngineBuilder {
            vendors,
            logins,
            rate_policy: RatePolicy::default(),
            travel_policy: TravelPolicy::default(),
            fraud_policy: FraudPolicy::default(),
            breaker_config: BreakerConfig::default(),
            clock: None,
            gate: None,
            write_protection: None,
            max_identities: 10_000,
            subscriber_capacity: 64,
        }
    }

    /// Record an inbound request for `identity` and score it.
    ///
    /// Crossing the block threshold publishes a CRITICAL `RATE_ANOMALY`
    /// event. Rate assessment is the protective layer itself, so it keeps
    /// running during lockdown.
    pub fn assess_request(&self, identity: &str) -> RequestAssessment {
        let threat_score = self.tracker.record_and_score(identity);
        let should_block = threat_score > RATE_BLOCK_THRESHOLD;

        if should_block {
            let policy = self.tracker.policy();
            self.publish(ThreatEvent::new(
                ThreatKind::RateAnomaly,
                Severity::Critical,
                format!(
                    "{} exceeded {} requests per {:.1}s",
                    identity,
                    policy.threshold_count,
                    policy.window.as_secs_f64()
                ),
                json!({
                    "identity": identity,
                    "threat_score": (threat_score * 100.0).round() / 100.0,
                }),
            ));
        }

        RequestAssessment {
            threat_score,
            should_block,
        }
    }

    /// Evaluate the current login against the identity's stored previous
    /// login.
    ///
    /// Returns `Ok(None)` when there is no prior record (first login, an
    /// unreachable history store, or an unevaluable pair) — all treated as
    /// non-impossible. On an impossible classification, publishes a
    /// CRITICAL `IMPOSSIBLE_TRAVEL` event naming both locations, addresses
    /// and the computed speed. The caller persists `current` as the new
    /// last login, and the verdict alongside it.
    pub fn assess_login(
        &self,
        current: &LoginEvent,
    ) -> Result<Option<TravelVerdict>, LockdownActive> {
        self.gate.check_mutable()?;

        let previous = self
            .guarded_lookup("login history", || {
                self.logins.last_login(&current.identity)
            })
            .flatten();

        let Some(previous) = previous else {
            return Ok(None);
        };

        let verdict = self.travel.evaluate(&previous, current);

        if let Some(v) = &verdict {
            if v.is_impossible {
                self.publish(ThreatEvent::new(
                    ThreatKind::ImpossibleTravel,
                    Severity::Critical,
                    format!(
                        "{} logged in from {} ({:.2}, {:.2}) then {} ({:.2}, {:.2}): \
                         {:.0} km in {:.2} h implies {:.0} km/h",
                        current.identity,
                        previous.source_address,
                        previous.latitude.unwrap_or_default(),
                        previous.longitude.unwrap_or_default(),
                        current.source_address,
                        current.latitude.unwrap_or_default(),
                        current.longitude.unwrap_or_default(),
                        v.distance_km,
                        v.elapsed_hours,
                        v.implied_speed_kmh
                    ),
                    json!({
                        "identity": current.identity,
                        "previous": {
                            "address": previous.source_address,
                            "latitude": previous.latitude,
                            "longitude": previous.longitude,
                            "timestamp": previous.timestamp,
                        },
                        "current": {
                            "address": current.source_address,
                            "latitude": current.latitude,
                            "longitude": current.longitude,
                            "timestamp": current.timestamp,
                        },
                        "distance_km": v.distance_km,
                        "elapsed_hours": v.elapsed_hours,
                        "implied_speed_kmh": v.implied_speed_kmh,
                    }),
                ));
            }
        }

        Ok(verdict)
    }

    /// Score a financial-document extraction.
    ///
    /// Looks the vendor up through the circuit breaker; an unreachable
    /// ledger falls back to the cold-start branch rather than failing the
    /// pass. A suspicious verdict publishes a CRITICAL `FRAUD_ANOMALY`
    /// event; the caller persists the verdict either way.
    pub fn assess_document(
        &self,
        extraction: &DocumentExtraction,
    ) -> Result<RiskVerdict, LockdownActive> {
        self.gate.check_mutable()?;

        let record = self
            .guarded_lookup("vendor ledger", || {
                self.vendors.find_by_name(&extraction.vendor_name)
            })
            .flatten();

        let verdict = self.fraud.score(extraction, record.as_ref());

        if verdict.is_suspicious {
            self.publish(ThreatEvent::new(
                ThreatKind::FraudAnomaly,
                Severity::Critical,
                format!(
                    "Fraud probable: {} risk factors detected for vendor {}",
                    verdict.alerts.len(),
                    extraction.vendor_name
                ),
                json!({
                    "vendor_name": extraction.vendor_name,
                    "amount": extraction.amount,
                    "score": verdict.score,
                    "alerts": verdict.alerts,
                }),
            ));
        }

        Ok(verdict)
    }

    /// Register a new live subscriber for threat events.
    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe()
    }

    /// Toggle lockdown on the engine's gate.
    pub fn set_lockdown(&self, enabled: bool) {
        self.gate.set_lockdown(enabled);
    }

    /// The engine's access gate.
    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    /// The engine's event bus.
    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    /// Shared engine counters.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Snapshot for health surfaces.
    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            lockdown_active: self.gate.is_locked(),
            tracked_identities: self.tracker.identity_count(),
            subscriber_count: self.bus.subscriber_count(),
        }
    }

    /// Run a collaborator lookup behind the circuit breaker.
    ///
    /// Any failure (or an open circuit) resolves to `None`, which every
    /// caller treats as "no prior record".
    fn guarded_lookup<T>(
        &self,
        collaborator: &str,
        lookup: impl FnOnce() -> Result<T, StoreUnavailable>,
    ) -> Option<T> {
        if !self.breaker.call_permitted() {
            tracing::debug!(collaborator, "circuit open, skipping lookup");
            return None;
        }

        match lookup() {
            Ok(value) => {
                self.breaker.record_success();
                Some(value)
            }
            Err(error) => {
                self.breaker.record_failure();
                self.metrics.record_collaborator_failure();
                tracing::warn!(
                    collaborator,
                    %error,
                    "lookup failed, falling back to no-record branch"
                );
                None
            }
        }
    }

    fn publish(&self, event: ThreatEvent) {
        tracing::warn!(
            kind = %event.kind,
            severity = %event.severity,
            message = %event.message,
            "threat detected"
        );
        self.bus.publish(event);
    }
}

/// Builder for [`RiskEngine`]; validation happens in [`build`].
///
/// [`build`]: RiskEngineBuilder::build
pub struct RiskEngineBuilder {
    vendors: Arc<dyn VendorLedger>,
    logins: Arc<dyn LoginHistoryStore>,
    rate_policy: RatePolicy,
    travel_policy: TravelPolicy,
    fraud_policy: FraudPolicy,
    breaker_config: BreakerConfig,
    clock: Option<Arc<dyn Clock>>,
    gate: Option<Arc<AccessGate>>,
    write_protection: Option<Arc<dyn WriteProtection>>,
    max_identities: usize,
    subscriber_capacity: usize,
}

impl RiskEngineBuilder {
    /// Set the sliding-window rate policy.
    pub fn with_rate_policy(mut self, policy: RatePolicy) -> Self {
        self.rate_policy = policy;
        self
    }

    /// Set the impossible-travel policy.
    pub fn with_travel_policy(mut self, policy: TravelPolicy) -> Self {
        self.travel_policy = policy;
        self
    }

    /// Set the fraud-scoring policy.
    pub fn with_fraud_policy(mut self, policy: FraudPolicy) -> Self {
        self.fraud_policy = policy;
        self
    }

    /// Set the collaborator circuit-breaker configuration.
    pub fn with_breaker_config(mut self, config: BreakerConfig) -> Self {
        self.breaker_config = config;
        self
    }

    /// Set a custom clock (mainly for testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Share an existing gate between engines. Takes precedence over
    /// [`with_write_protection`].
    ///
    /// [`with_write_protection`]: RiskEngineBuilder::with_write_protection
    pub fn with_gate(mut self, gate: Arc<AccessGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Have the engine's gate propagate lockdown toggles to the backing
    /// store.
    pub fn with_write_protection(mut self, store: Arc<dyn WriteProtection>) -> Self {
        self.write_protection = Some(store);
        self
    }

    /// Bound on tracked identities before LRU eviction. Default 10,000.
    pub fn with_max_identities(mut self, max_identities: usize) -> Self {
        self.max_identities = max_identities;
        self
    }

    /// Per-subscriber channel capacity. A subscriber that falls this far
    /// behind is dropped on the next publish. Default 64.
    pub fn with_subscriber_capacity(mut self, capacity: usize) -> Self {
        self.subscriber_capacity = capacity;
        self
    }

    /// Validate the configuration and assemble the engine.
    pub fn build(self) -> Result<RiskEngine, BuildError> {
        if self.rate_policy.window.is_zero() {
            return Err(BuildError::ZeroRateWindow);
        }
        if self.rate_policy.threshold_count == 0 {
            return Err(BuildError::ZeroThresholdCount);
        }
        if !(self.travel_policy.max_speed_kmh > 0.0) {
            return Err(BuildError::NonPositiveTravelSpeed);
        }
        if self.fraud_policy.suspicious_threshold > 100 {
            return Err(BuildError::SuspiciousThresholdOutOfRange);
        }
        if self.max_identities == 0 {
            return Err(BuildError::ZeroMaxIdentities);
        }
        if self.subscriber_capacity == 0 {
            return Err(BuildError::ZeroSubscriberCapacity);
        }

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock::new()) as Arc<dyn Clock>);
        let gate = self.gate.unwrap_or_else(|| {
            Arc::new(match self.write_protection {
                Some(store) => AccessGate::with_store(store),
                None => AccessGate::new(),
            })
        });

        let metrics = Metrics::new();
        let storage: WindowStorage = Arc::new(ShardedStorage::new());

        Ok(RiskEngine {
            tracker: RateWindowTracker::new(
                storage,
                clock,
                self.rate_policy,
                self.max_identities,
                metrics.clone(),
            ),
            travel: TravelAnomalyDetector::new(self.travel_policy),
            fraud: FraudHeuristicEngine::new(self.fraud_policy),
            bus: EventBus::new(self.subscriber_capacity, metrics.clone()),
            gate,
            vendors: self.vendors,
            logins: self.logins,
            breaker: Arc::new(CircuitBreaker::with_config(self.breaker_config)),
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mocks::{InMemoryLoginHistory, InMemoryVendorLedger};
    use std::time::Duration;

    fn engine() -> RiskEngine {
        RiskEngine::builder(
            Arc::new(InMemoryVendorLedger::new()),
            Arc::new(InMemoryLoginHistory::new()),
        )
        .build()
        .unwrap()
    }

    #[test]
    fn test_build_with_defaults() {
        let engine = engine();
        let status = engine.status();
        assert!(!status.lockdown_active);
        assert_eq!(status.tracked_identities, 0);
        assert_eq!(status.subscriber_count, 0);
    }

    #[test]
    fn test_build_rejects_zero_window() {
        let result = RiskEngine::builder(
            Arc::new(InMemoryVendorLedger::new()),
            Arc::new(InMemoryLoginHistory::new()),
        )
        .with_rate_policy(RatePolicy {
            window: Duration::ZERO,
            threshold_count: 20,
        })
        .build();
        assert!(matches!(result, Err(BuildError::ZeroRateWindow)));
    }

    #[test]
    fn test_build_rejects_zero_threshold() {
        let result = RiskEngine::builder(
            Arc::new(InMemoryVendorLedger::new()),
            Arc::new(InMemoryLoginHistory::new()),
        )
        .with_rate_policy(RatePolicy {
            window: Duration::from_secs(1),
            threshold_count: 0,
        })
        .build();
        assert!(matches!(result, Err(BuildError::ZeroThresholdCount)));
    }

    #[test]
    fn test_build_rejects_nan_travel_speed() {
        let result = RiskEngine::builder(
            Arc::new(InMemoryVendorLedger::new()),
            Arc::new(InMemoryLoginHistory::new()),
        )
        .with_travel_policy(TravelPolicy {
            max_speed_kmh: f64::NAN,
        })
        .build();
        assert!(matches!(result, Err(BuildError::NonPositiveTravelSpeed)));
    }

    #[test]
    fn test_build_rejects_out_of_range_fraud_threshold() {
        let mut policy = FraudPolicy::default();
        policy.suspicious_threshold = 101;
        let result = RiskEngine::builder(
            Arc::new(InMemoryVendorLedger::new()),
            Arc::new(InMemoryLoginHistory::new()),
        )
        .with_fraud_policy(policy)
        .build();
        assert!(matches!(
            result,
            Err(BuildError::SuspiciousThresholdOutOfRange)
        ));
    }

    #[test]
    fn test_quiet_request_is_not_blocked() {
        let engine = engine();
        let assessment = engine.assess_request("203.0.113.7");
        assert!(!assessment.should_block);
        assert!(assessment.threat_score < RATE_BLOCK_THRESHOLD);
    }

    #[test]
    fn test_lockdown_refuses_mutating_entry_points() {
        let engine = engine();
        engine.set_lockdown(true);

        let login = LoginEvent {
            identity: "alice".to_string(),
            source_address: "203.0.113.9".to_string(),
            latitude: Some(50.0),
            longitude: Some(30.0),
            timestamp: chrono::Utc::now(),
        };
        assert_eq!(engine.assess_login(&login), Err(LockdownActive));
        assert_eq!(
            engine.assess_document(&DocumentExtraction::default()),
            Err(LockdownActive)
        );

        // Rate assessment is the protective layer itself and keeps running.
        let assessment = engine.assess_request("203.0.113.9");
        assert!(!assessment.should_block);

        engine.set_lockdown(false);
        assert!(engine.assess_login(&login).is_ok());
    }

    #[test]
    fn test_unavailable_ledger_scores_as_cold_start() {
        let vendors = Arc::new(InMemoryVendorLedger::new());
        vendors.insert(
            "Acme",
            crate::domain::fraud::VendorRecord {
                vendor_id: "v1".to_string(),
                known_bank_fingerprint: "H1".to_string(),
                historical_average_amount: Some(1000.0),
            },
        );
        vendors.set_unavailable(true);

        let engine = RiskEngine::builder(vendors.clone(), Arc::new(InMemoryLoginHistory::new()))
            .build()
            .unwrap();

        let doc = DocumentExtraction {
            vendor_name: "Acme".to_string(),
            amount: 200.0,
            ..DocumentExtraction::default()
        };
        let verdict = engine.assess_document(&doc).unwrap();

        // Cold-start branch, not an error and not a bank-mismatch check.
        assert_eq!(verdict.score, 30);
        assert_eq!(engine.metrics().collaborator_failures(), 1);
    }

    #[test]
    fn test_unavailable_history_treated_as_first_login() {
        let logins = Arc::new(InMemoryLoginHistory::new());
        logins.set_unavailable(true);

        let engine = RiskEngine::builder(Arc::new(InMemoryVendorLedger::new()), logins)
            .build()
            .unwrap();

        let login = LoginEvent {
            identity: "alice".to_string(),
            source_address: "203.0.113.9".to_string(),
            latitude: Some(50.0),
            longitude: Some(30.0),
            timestamp: chrono::Utc::now(),
        };
        assert_eq!(engine.assess_login(&login), Ok(None));
    }
}
