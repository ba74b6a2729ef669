//! Heuristic fraud scoring for financial-document extractions.
//!
//! Rules run in a fixed order, each adding to a running score and appending
//! at most one alert. Content heuristics are purely additive; relational
//! checks against a known vendor record use floor overrides (`max(score,
//! floor)`), which always win over accumulation. Unknown vendors take the
//! cold-start branch instead. Missing fields degrade to empty strings and
//! zero amounts; scoring never fails.

use crate::domain::score::{clamp_score, floor_override};
use serde::{Deserialize, Serialize};

const BASELINE_SCORE: i64 = 10;
const PRESSURE_LANGUAGE_SCORE: i64 = 30;
const DOMAIN_MISMATCH_SCORE: i64 = 40;
const PAYMENT_CHANGE_SCORE: i64 = 50;
const BANK_MISMATCH_FLOOR: i64 = 95;
const VELOCITY_ANOMALY_FLOOR: i64 = 85;
const COLD_START_SCORE: i64 = 20;
const HIGH_VALUE_COLD_START_SCORE: i64 = 15;

/// Structured fields extracted from a financial document by the external
/// extraction collaborator. All fields are optional in practice; absent
/// values arrive as empty strings or zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentExtraction {
    pub vendor_name: String,
    pub tax_id: String,
    pub bank_fingerprint: String,
    pub amount: f64,
    pub date: String,
    pub raw_text: String,
    pub contact_email: String,
}

/// The ledger's ground truth for a known vendor. Read-only to the engine;
/// a missing record is the cold-start case, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorRecord {
    pub vendor_id: String,
    pub known_bank_fingerprint: String,
    /// Average of prior bill amounts; `None` when no bills exist yet.
    pub historical_average_amount: Option<f64>,
}

/// Final output of a scoring pass. The caller persists it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskVerdict {
    /// Clamped to `[0, 100]`.
    pub score: u8,
    /// Alert strings in the order the rules fired, one per rule at most.
    pub alerts: Vec<String>,
    /// `score > suspicious_threshold`.
    pub is_suspicious: bool,
}

/// Configured heuristics for the fraud engine.
#[derive(Debug, Clone)]
pub struct FraudPolicy {
    /// Scores strictly above this are suspicious.
    pub suspicious_threshold: u8,
    /// Cold-start amounts above this require manual approval.
    pub high_value_threshold: f64,
    /// Amounts above `multiplier x historical average` are velocity
    /// anomalies.
    pub velocity_multiplier: f64,
    /// Historical average assumed for known vendors with no prior bills.
    pub default_historical_average: f64,
    /// Social-engineering pressure phrases, matched case-insensitively.
    pub pressure_phrases: Vec<String>,
    /// `(brand substring, canonical email domain)` pairs for spoof
    /// detection.
    pub brand_domains: Vec<(String, String)>,
    /// Banking-reference terms for the payment-change rule.
    pub banking_terms: Vec<String>,
    /// Change-of-detail terms for the payment-change rule.
    pub change_terms: Vec<String>,
    /// Well-known entity names the cold-start branch reports against,
    /// informationally.
    pub public_entity_keywords: Vec<String>,
}

impl Default for FraudPolicy {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            suspicious_threshold: 70,
            high_value_threshold: 5000.0,
            velocity_multiplier: 3.0,
            default_historical_average: 1000.0,
            pressure_phrases: owned(&[
                "urgent",
                "final notice",
                "disconnection",
                "action required",
                "effective immediately",
            ]),
            brand_domains: vec![
                ("cloudflare".to_string(), "cloudflare.com".to_string()),
                ("paypal".to_string(), "paypal.com".to_string()),
                ("amazon".to_string(), "amazon.com".to_string()),
                ("microsoft".to_string(), "microsoft.com".to_string()),
                ("google".to_string(), "google.com".to_string()),
            ],
            banking_terms: owned(&["bank", "iban", "account", "routing"]),
            change_terms: owned(&["changed", "change", "updated", "new details"]),
            public_entity_keywords: owned(&[
                "cloudflare",
                "amazon",
                "google",
                "microsoft",
                "paypal",
                "apple",
                "netflix",
                "facebook",
            ]),
        }
    }
}

/// Multi-factor fraud scorer with a cold-start policy for unknown vendors.
#[derive(Debug, Clone, Default)]
pub struct FraudHeuristicEngine {
    policy: FraudPolicy,
}

impl FraudHeuristicEngine {
    pub fn new(policy: FraudPolicy) -> Self {
        Self { policy }
    }

    /// Score an extraction against the vendor record the caller looked up.
    ///
    /// `vendor` is `None` for cold-start vendors — and for callers whose
    /// ledger was unreachable, which must be treated the same way rather
    /// than failing the pass.
    pub fn score(
        &self,
        extraction: &DocumentExtraction,
        vendor: Option<&VendorRecord>,
    ) -> RiskVerdict {
        let mut score: i64 = BASELINE_SCORE;
        let mut alerts: Vec<String> = Vec::new();

        let text = extraction.raw_text.to_lowercase();
        let vendor_name = extraction.vendor_name.to_lowercase();
        let email = extraction.contact_email.to_lowercase();

        // Social-engineering language: first matching phrase only, never
        // double-counted across multiple hits.
        if let Some(phrase) = self
            .policy
            .pressure_phrases
            .iter()
            .find(|p| text.contains(&p.to_lowercase()))
        {
            score += PRESSURE_LANGUAGE_SCORE;
            alerts.push(format!(
                "Urgency detected: '{}' flagged as social engineering",
                phrase
            ));
        }

        // Display name claims a known brand but the contact domain does not
        // match that brand's canonical domain.
        if let Some((brand, domain)) = self
            .policy
            .brand_domains
            .iter()
            .find(|(brand, _)| vendor_name.contains(brand.as_str()))
        {
            if !email.contains(domain.as_str()) {
                score += DOMAIN_MISMATCH_SCORE;
                alerts.push(format!(
                    "Domain mismatch: vendor '{}' claims brand '{}' but uses contact '{}'",
                    extraction.vendor_name, brand, extraction.contact_email
                ));
            }
        }

        // Payment-instruction change language: needs both a banking term
        // and a change-of-detail term.
        let mentions_banking = self
            .policy
            .banking_terms
            .iter()
            .any(|t| text.contains(t.as_str()));
        let mentions_change = self
            .policy
            .change_terms
            .iter()
            .any(|t| text.contains(t.as_str()));
        if mentions_banking && mentions_change {
            score += PAYMENT_CHANGE_SCORE;
            alerts.push("Language indicating a payment-detail change detected".to_string());
        }

        // Relational verification against the ledger, or the cold-start
        // branch when no record exists.
        match vendor {
            Some(record) => {
                let historical_average = record
                    .historical_average_amount
                    .unwrap_or(self.policy.default_historical_average);

                if extraction.bank_fingerprint != record.known_bank_fingerprint {
                    score = floor_override(score, BANK_MISMATCH_FLOOR);
                    alerts.push(format!(
                        "Bank fingerprint mismatch: expected {}, got {}",
                        record.known_bank_fingerprint, extraction.bank_fingerprint
                    ));
                }

                if extraction.amount > historical_average * self.policy.velocity_multiplier {
                    score = floor_override(score, VELOCITY_ANOMALY_FLOOR);
                    let multiple = extraction.amount / historical_average;
                    alerts.push(format!(
                        "Velocity anomaly: amount {:.2} is {:.0}x the historical average",
                        extraction.amount, multiple
                    ));
                }
            }
            None => {
                score += COLD_START_SCORE;
                alerts.push("New vendor: first invoice on record".to_string());

                if extraction.amount > self.policy.high_value_threshold {
                    score += HIGH_VALUE_COLD_START_SCORE;
                    alerts
                        .push("High-value first-time payment requires manual approval".to_string());
                }

                match self
                    .policy
                    .public_entity_keywords
                    .iter()
                    .find(|k| vendor_name.contains(k.as_str()))
                {
                    Some(keyword) => alerts.push(format!(
                        "Vendor name resembles known public entity '{}'",
                        keyword
                    )),
                    None => alerts
                        .push("Vendor name does not match any known public entity".to_string()),
                }
            }
        }

        let score = clamp_score(score);
        RiskVerdict {
            score,
            is_suspicious: score > self.policy.suspicious_threshold,
            alerts,
        }
    }

    /// Convenience wrapper that takes the lookup itself, for callers that
    /// own their ledger access.
    pub fn score_with_lookup<F>(&self, extraction: &DocumentExtraction, lookup: F) -> RiskVerdict
    where
        F: FnOnce(&str) -> Option<VendorRecord>,
    {
        let record = lookup(&extraction.vendor_name);
        self.score(extraction, record.as_ref())
    }

    pub fn policy(&self) -> &FraudPolicy {
        &self.policy
    }
}
