//! Run the three detectors against a burst, a stolen credential, and a
//! spoofed invoice, printing every event a live subscriber sees.
//!
//! ```sh
//! cargo run --example basic
//! ```

use chrono::{Duration, Utc};
use riskgate::{
    DocumentExtraction, InMemoryLoginHistory, InMemoryVendorLedger, LoginEvent, RiskEngine,
    VendorRecord,
};
use std::sync::Arc;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "riskgate=debug".into()),
        )
        .init();

    let vendors = Arc::new(InMemoryVendorLedger::new());
    vendors.insert(
        "CloudFlare",
        VendorRecord {
            vendor_id: "v-cf".to_string(),
            known_bank_fingerprint: "HASH_CF_001".to_string(),
            historical_average_amount: Some(1043.0),
        },
    );
    let history = Arc::new(InMemoryLoginHistory::new());

    let engine = RiskEngine::builder(vendors, history.clone())
        .build()
        .expect("default configuration is valid");

    let mut alerts = engine.subscribe();

    // 1. A request burst from one address.
    for _ in 0..25 {
        engine.assess_request("203.0.113.9");
    }
    let assessment = engine.assess_request("203.0.113.9");
    println!(
        "burst: score {:.1}, blocked: {}",
        assessment.threat_score, assessment.should_block
    );

    // 2. A login from the other side of the continent an hour later.
    let first = LoginEvent {
        identity: "alice".to_string(),
        source_address: "198.51.100.4".to_string(),
        latitude: Some(50.0),
        longitude: Some(30.0),
        timestamp: Utc::now() - Duration::hours(1),
    };
    history.record_login(first);

    let second = LoginEvent {
        identity: "alice".to_string(),
        source_address: "203.0.113.77".to_string(),
        latitude: Some(56.0),
        longitude: Some(37.0),
        timestamp: Utc::now(),
    };
    if let Some(verdict) = engine.assess_login(&second).unwrap() {
        println!(
            "travel: {:.0} km at {:.0} km/h, impossible: {}",
            verdict.distance_km, verdict.implied_speed_kmh, verdict.is_impossible
        );
    }

    // 3. A spoofed invoice claiming to be the known vendor.
    let extraction = DocumentExtraction {
        vendor_name: "CloudFlare".to_string(),
        tax_id: "TAX-8821".to_string(),
        bank_fingerprint: "GB89_FAKE_IBAN".to_string(),
        amount: 26_500.0,
        date: Utc::now().format("%Y-%m-%d").to_string(),
        raw_text: "URGENT: FINAL NOTICE. Our payment details have changed, remit to the \
                   new bank account below."
            .to_string(),
        contact_email: "billing-support@cloudflare-payments-dept.com".to_string(),
    };
    let verdict = engine.assess_document(&extraction).unwrap();
    println!(
        "fraud: score {}, suspicious: {}, alerts:",
        verdict.score, verdict.is_suspicious
    );
    for alert in &verdict.alerts {
        println!("  - {}", alert);
    }

    // Drain everything the subscriber saw.
    println!("\nevents delivered to the subscriber:");
    while let Some(event) = alerts.try_recv() {
        println!("  [{}] {} - {}", event.severity, event.kind, event.message);
    }
}
