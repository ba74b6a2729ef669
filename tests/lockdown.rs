//! Lockdown gate behavior across the engine's mutating entry points.

use chrono::Utc;
use riskgate::{
    AccessGate, DocumentExtraction, InMemoryLoginHistory, InMemoryVendorLedger, LockdownActive,
    LoginEvent, MockWriteProtection, RiskEngine,
};
use std::sync::Arc;

fn login(identity: &str) -> LoginEvent {
    LoginEvent {
        identity: identity.to_string(),
        source_address: "203.0.113.9".to_string(),
        latitude: Some(50.0),
        longitude: Some(30.0),
        timestamp: Utc::now(),
    }
}

#[test]
fn test_mutating_calls_refused_uniformly_while_locked() {
    let engine = RiskEngine::builder(
        Arc::new(InMemoryVendorLedger::new()),
        Arc::new(InMemoryLoginHistory::new()),
    )
    .build()
    .unwrap();

    engine.set_lockdown(true);
    assert!(engine.status().lockdown_active);

    let login_refusal = engine.assess_login(&login("alice")).unwrap_err();
    let document_refusal = engine
        .assess_document(&DocumentExtraction::default())
        .unwrap_err();

    // The same uniform signal everywhere, not per-endpoint errors.
    assert_eq!(login_refusal, document_refusal);
    assert_eq!(
        login_refusal.to_string(),
        "service unavailable: lockdown active, system is read-only"
    );

    engine.set_lockdown(false);
    assert!(engine.assess_login(&login("alice")).is_ok());
    assert!(engine
        .assess_document(&DocumentExtraction::default())
        .is_ok());
}

#[test]
fn test_lockdown_propagates_to_store_write_protection() {
    let protection = Arc::new(MockWriteProtection::new());
    let engine = RiskEngine::builder(
        Arc::new(InMemoryVendorLedger::new()),
        Arc::new(InMemoryLoginHistory::new()),
    )
    .with_write_protection(protection.clone())
    .build()
    .unwrap();

    engine.set_lockdown(true);
    assert!(protection.is_read_only());

    engine.set_lockdown(false);
    assert!(!protection.is_read_only());
}

#[test]
fn test_failed_propagation_still_enforces_lockdown() {
    let protection = Arc::new(MockWriteProtection::new());
    protection.set_failing(true);

    let engine = RiskEngine::builder(
        Arc::new(InMemoryVendorLedger::new()),
        Arc::new(InMemoryLoginHistory::new()),
    )
    .with_write_protection(protection.clone())
    .build()
    .unwrap();

    engine.set_lockdown(true);

    // Store-level protection never engaged, in-process gate holds anyway.
    assert!(!protection.is_read_only());
    assert_eq!(
        engine.assess_login(&login("alice")),
        Err(LockdownActive)
    );
}

#[test]
fn test_rate_assessment_runs_during_lockdown() {
    let engine = RiskEngine::builder(
        Arc::new(InMemoryVendorLedger::new()),
        Arc::new(InMemoryLoginHistory::new()),
    )
    .build()
    .unwrap();

    engine.set_lockdown(true);

    // The rate tracker is the protective layer itself; lockdown must not
    // blind it.
    for _ in 0..25 {
        engine.assess_request("203.0.113.9");
    }
    assert!(engine.assess_request("203.0.113.9").should_block);
}

#[test]
fn test_shared_gate_across_engines() {
    let gate = Arc::new(AccessGate::new());

    let build = |gate: Arc<AccessGate>| {
        RiskEngine::builder(
            Arc::new(InMemoryVendorLedger::new()),
            Arc::new(InMemoryLoginHistory::new()),
        )
        .with_gate(gate)
        .build()
        .unwrap()
    };
    let first = build(gate.clone());
    let second = build(gate.clone());

    gate.set_lockdown(true);
    assert!(first.status().lockdown_active);
    assert!(second.status().lockdown_active);
    assert!(first.assess_login(&login("alice")).is_err());
    assert!(second.assess_login(&login("alice")).is_err());
}
