//! Circuit breaker guarding collaborator lookups.
//!
//! Vendor-ledger and login-history lookups can fail when the backing store
//! is unreachable. Risk assessment must not crash or stall on that: after a
//! run of consecutive failures the circuit opens and lookups short-circuit
//! straight to the cold-start / no-prior-record branch until a recovery
//! timeout has elapsed. Fail-open, never an error to the caller.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant};

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Operating normally, lookups go through
    Closed = 0,
    /// Too many failures, lookups are skipped
    Open = 1,
    /// Probing whether the collaborator has recovered
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }
}

/// Configuration for circuit breaker behavior.
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,
    /// How long to wait before probing for recovery
    pub recovery_timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
        }
    }
}

/// Fail-open circuit breaker for collaborator access.
#[derive(Debug)]
pub struct CircuitBreaker {
    state: AtomicU8,
    consecutive_failures: AtomicU64,
    last_failure_nanos: AtomicU64,
    config: BreakerConfig,
    /// Reference epoch for timestamp storage in atomics
    epoch: Instant,
}

impl CircuitBreaker {
    /// Create a breaker with default configuration.
    pub fn new() -> Self {
        Self::with_config(BreakerConfig::default())
    }

    /// Create a breaker with custom configuration.
    pub fn with_config(config: BreakerConfig) -> Self {
        Self {
            state: AtomicU8::new(CircuitState::Closed as u8),
            consecutive_failures: AtomicU64::new(0),
            last_failure_nanos: AtomicU64::new(0),
            config,
            epoch: Instant::now(),
        }
    }

    /// Get the current circuit state.
    pub fn state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::Acquire))
    }

    /// Whether a lookup should be attempted right now.
    ///
    /// Returns `false` while the circuit is open; callers then take the
    /// no-record branch without touching the collaborator.
    pub fn call_permitted(&self) -> bool {
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let now = Instant::now();
                if now.duration_since(self.last_failure_time()) >= self.config.recovery_timeout {
                    // Only one thread wins the transition to half-open; the
                    // winner (or anyone observing half-open) may probe.
                    let result = self.state.compare_exchange(
                        CircuitState::Open as u8,
                        CircuitState::HalfOpen as u8,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    );
                    result.is_ok() || self.state() == CircuitState::HalfOpen
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => true,
        }
    }

    /// Record a successful lookup.
    pub fn record_success(&self) {
        match self.state() {
            CircuitState::HalfOpen | CircuitState::Closed => {
                self.consecutive_failures.store(0, Ordering::Release);
                self.state
                    .store(CircuitState::Closed as u8, Ordering::Release);
            }
            CircuitState::Open => {}
        }
    }

    /// Record a failed lookup.
    pub fn record_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;

        let nanos = Instant::now()
            .duration_since(self.epoch)
            .as_nanos()
            .try_into()
            .unwrap_or(u64::MAX);
        self.last_failure_nanos.store(nanos, Ordering::Release);

        match self.state() {
            CircuitState::HalfOpen => {
                self.state
                    .store(CircuitState::Open as u8, Ordering::Release);
            }
            CircuitState::Closed => {
                if failures >= self.config.failure_threshold as u64 {
                    self.state
                        .store(CircuitState::Open as u8, Ordering::Release);
                }
            }
            CircuitState::Open => {}
        }
    }

    /// Number of consecutive failures observed.
    pub fn consecutive_failures(&self) -> u64 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    /// Force the breaker back to the closed state.
    pub fn reset(&self) {
        self.state
            .store(CircuitState::Closed as u8, Ordering::Release);
        self.consecutive_failures.store(0, Ordering::Release);
    }

    fn last_failure_time(&self) -> Instant {
        let nanos = self.last_failure_nanos.load(Ordering::Acquire);
        self.epoch + Duration::from_nanos(nanos)
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}
