use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use riskgate::{
    DocumentExtraction, FraudHeuristicEngine, LoginEvent, Metrics, RatePolicy, RateWindowTracker,
    ShardedStorage, SystemClock, TravelAnomalyDetector, VendorRecord,
};
use std::sync::Arc;

/// Benchmark the great-circle / travel classification hot path
fn bench_travel_evaluation(c: &mut Criterion) {
    let detector = TravelAnomalyDetector::default();
    let prev = LoginEvent {
        identity: "alice".to_string(),
        source_address: "198.51.100.4".to_string(),
        latitude: Some(50.0),
        longitude: Some(30.0),
        timestamp: chrono::Utc::now(),
    };
    let curr = LoginEvent {
        identity: "alice".to_string(),
        source_address: "203.0.113.77".to_string(),
        latitude: Some(56.0),
        longitude: Some(37.0),
        timestamp: prev.timestamp + chrono::Duration::hours(1),
    };

    c.bench_function("travel_evaluate", |b| {
        b.iter(|| detector.evaluate(black_box(&prev), black_box(&curr)))
    });
}

/// Benchmark fraud scoring for the worst-case rule path
fn bench_fraud_scoring(c: &mut Criterion) {
    let engine = FraudHeuristicEngine::default();
    let extraction = DocumentExtraction {
        vendor_name: "CloudFlare".to_string(),
        tax_id: "TAX-8821".to_string(),
        bank_fingerprint: "GB89_FAKE_IBAN".to_string(),
        amount: 26_500.0,
        date: "2025-06-01".to_string(),
        raw_text: "URGENT: FINAL NOTICE. Our payment details have changed, remit to the \
                   new bank account below."
            .to_string(),
        contact_email: "billing-support@cloudflare-payments-dept.com".to_string(),
    };
    let record = VendorRecord {
        vendor_id: "v-cf".to_string(),
        known_bank_fingerprint: "HASH_CF_001".to_string(),
        historical_average_amount: Some(1043.0),
    };

    let mut group = c.benchmark_group("fraud");
    group.bench_function("score_known_vendor", |b| {
        b.iter(|| engine.score(black_box(&extraction), black_box(Some(&record))))
    });
    group.bench_function("score_cold_start", |b| {
        b.iter(|| engine.score(black_box(&extraction), black_box(None)))
    });
    group.finish();
}

/// Benchmark single-threaded rate tracking throughput
fn bench_rate_tracking(c: &mut Criterion) {
    let mut group = c.benchmark_group("rate_tracking");
    group.throughput(Throughput::Elements(1000));

    group.bench_function("record_and_score_single_identity", |b| {
        let tracker = RateWindowTracker::new(
            Arc::new(ShardedStorage::new()),
            Arc::new(SystemClock::new()),
            RatePolicy::default(),
            10_000,
            Metrics::new(),
        );

        b.iter(|| {
            for _ in 0..1000 {
                black_box(tracker.record_and_score(black_box("203.0.113.9")));
            }
        })
    });

    group.bench_function("record_and_score_many_identities", |b| {
        let tracker = RateWindowTracker::new(
            Arc::new(ShardedStorage::new()),
            Arc::new(SystemClock::new()),
            RatePolicy::default(),
            10_000,
            Metrics::new(),
        );
        let identities: Vec<String> = (0..1000).map(|i| format!("identity-{}", i)).collect();

        b.iter(|| {
            for identity in &identities {
                black_box(tracker.record_and_score(black_box(identity)));
            }
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_travel_evaluation,
    bench_fraud_scoring,
    bench_rate_tracking
);
criterion_main!(benches);
