//! Toggle lockdown and watch mutating entry points refuse uniformly while
//! rate assessment keeps running.
//!
//! ```sh
//! cargo run --example lockdown
//! ```

use riskgate::{
    DocumentExtraction, InMemoryLoginHistory, InMemoryVendorLedger, MockWriteProtection,
    RiskEngine,
};
use std::sync::Arc;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "riskgate=info".into()),
        )
        .init();

    let protection = Arc::new(MockWriteProtection::new());
    let engine = RiskEngine::builder(
        Arc::new(InMemoryVendorLedger::new()),
        Arc::new(InMemoryLoginHistory::new()),
    )
    .with_write_protection(protection.clone())
    .build()
    .expect("default configuration is valid");

    engine.set_lockdown(true);
    println!(
        "lockdown active: {}, store read-only: {}",
        engine.status().lockdown_active,
        protection.is_read_only()
    );

    match engine.assess_document(&DocumentExtraction::default()) {
        Ok(_) => println!("document scored (unexpected)"),
        Err(refusal) => println!("document refused: {}", refusal),
    }

    let assessment = engine.assess_request("203.0.113.9");
    println!(
        "rate assessment still runs: score {:.1}",
        assessment.threat_score
    );

    engine.set_lockdown(false);
    println!(
        "lockdown lifted: mutating calls accepted again: {}",
        engine.assess_document(&DocumentExtraction::default()).is_ok()
    );
}
