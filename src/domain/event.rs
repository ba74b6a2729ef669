//! Threat events delivered to live subscribers.
//!
//! Events are owned transiently by the publishing detector until handed to
//! the bus; the bus keeps no replay log, so a subscriber connecting after a
//! publish never sees it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What class of anomaly a detector found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreatKind {
    RateAnomaly,
    ImpossibleTravel,
    FraudAnomaly,
}

impl fmt::Display for ThreatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ThreatKind::RateAnomaly => "RATE_ANOMALY",
            ThreatKind::ImpossibleTravel => "IMPOSSIBLE_TRAVEL",
            ThreatKind::FraudAnomaly => "FRAUD_ANOMALY",
        };
        f.write_str(name)
    }
}

/// How urgently a finding needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        };
        f.write_str(name)
    }
}

/// A structured notification describing a detected anomaly.
///
/// The `payload` carries detector-specific structured data; transport
/// serialization (server-pushed frames and the like) is the subscriber's
/// concern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreatEvent {
    pub kind: ThreatKind,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub payload: serde_json::Value,
}

impl ThreatEvent {
    /// Create an event stamped with the current wall-clock time.
    pub fn new(
        kind: ThreatKind,
        severity: Severity,
        message: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            kind,
            severity,
            timestamp: Utc::now(),
            message: message.into(),
            payload,
        }
    }
}
