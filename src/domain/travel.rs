//! Impossible-travel detection over consecutive login locations.
//!
//! The detector is handed both login events by the caller, which owns the
//! retrieval of "previous" from persistent storage; it keeps no state of its
//! own and assumes nothing about the storage shape. Evaluating the same pair
//! twice yields an identical verdict.

use crate::domain::score::haversine_km;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Floor on the elapsed time so same-second logins do not divide by zero.
const MIN_ELAPSED_HOURS: f64 = 1.0 / 3600.0;

/// A single authenticated login observation.
///
/// The "previous" instance lives in an external login-history store; the
/// engine only ever reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginEvent {
    /// User key this login belongs to.
    pub identity: String,
    /// Network address the login originated from.
    pub source_address: String,
    /// Geolocated latitude, when resolution succeeded.
    pub latitude: Option<f64>,
    /// Geolocated longitude, when resolution succeeded.
    pub longitude: Option<f64>,
    /// When the login happened.
    pub timestamp: DateTime<Utc>,
}

/// Outcome of comparing two consecutive logins. Ephemeral; the engine never
/// persists it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TravelVerdict {
    pub distance_km: f64,
    pub elapsed_hours: f64,
    pub implied_speed_kmh: f64,
    pub is_impossible: bool,
}

/// Travel-speed classification threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct TravelPolicy {
    /// Fastest plausible human travel speed in km/h. Anything strictly
    /// above this between two logins indicates likely credential
    /// compromise.
    pub max_speed_kmh: f64,
}

impl Default for TravelPolicy {
    fn default() -> Self {
        // Faster than reasonable commercial air travel for the elapsed time.
        Self {
            max_speed_kmh: 500.0,
        }
    }
}

/// Stateless classifier for login-location velocity.
#[derive(Debug, Clone, Default)]
pub struct TravelAnomalyDetector {
    policy: TravelPolicy,
}

impl TravelAnomalyDetector {
    pub fn new(policy: TravelPolicy) -> Self {
        Self { policy }
    }

    /// Compare a previous and current login for the same identity.
    ///
    /// Returns `None` when the pair cannot be evaluated: either event lacks
    /// coordinates, or the current timestamp does not come after the
    /// previous one. Callers treat `None` as non-impossible.
    ///
    /// A speed exactly equal to the threshold is NOT impossible; only a
    /// strictly greater speed is.
    pub fn evaluate(&self, prev: &LoginEvent, curr: &LoginEvent) -> Option<TravelVerdict> {
        let (prev_lat, prev_lon) = (prev.latitude?, prev.longitude?);
        let (curr_lat, curr_lon) = (curr.latitude?, curr.longitude?);

        if curr.timestamp <= prev.timestamp {
            return None;
        }

        let distance_km = haversine_km(prev_lat, prev_lon, curr_lat, curr_lon);

        let elapsed = curr.timestamp - prev.timestamp;
        let elapsed_hours = (elapsed.num_milliseconds() as f64 / 3_600_000.0).max(MIN_ELAPSED_HOURS);

        let implied_speed_kmh = distance_km / elapsed_hours;

        Some(TravelVerdict {
            distance_km,
            elapsed_hours,
            implied_speed_kmh,
            is_impossible: implied_speed_kmh > self.policy.max_speed_kmh,
        })
    }

    pub fn policy(&self) -> &TravelPolicy {
        &self.policy
    }
}
