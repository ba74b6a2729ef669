//! Subscriber lifecycle guarantees of the event bus.

use riskgate::{EventBus, Metrics, Severity, ThreatEvent, ThreatKind};
use serde_json::json;

fn event(message: &str) -> ThreatEvent {
    ThreatEvent::new(
        ThreatKind::FraudAnomaly,
        Severity::Critical,
        message,
        json!({}),
    )
}

#[test]
fn test_unsubscribed_mid_stream_receives_nothing_further() {
    let bus = EventBus::new(16, Metrics::new());

    let mut staying = bus.subscribe();
    let mut leaving = bus.subscribe();

    bus.publish(event("first"));
    assert_eq!(leaving.try_recv().unwrap().message, "first");

    leaving.unsubscribe();

    // Everything published after unsubscribe returns is invisible to the
    // departed subscriber; the remaining one still gets it.
    bus.publish(event("second"));
    assert_eq!(staying.try_recv().unwrap().message, "first");
    assert_eq!(staying.try_recv().unwrap().message, "second");
    assert_eq!(bus.subscriber_count(), 1);
}

#[test]
fn test_dropped_receiver_is_garbage_collected_on_publish() {
    let metrics = Metrics::new();
    let bus = EventBus::new(16, metrics.clone());

    // An abrupt disconnect is just the handle going away.
    let subscription = bus.subscribe();
    drop(subscription);

    // Prompt removal happened at drop time, before any publish.
    assert_eq!(bus.subscriber_count(), 0);
    assert_eq!(bus.publish(event("into the void")), 0);
    assert_eq!(metrics.subscribers_dropped(), 0);
}

#[test]
fn test_each_subscriber_gets_its_own_copy() {
    let bus = EventBus::new(16, Metrics::new());
    let mut a = bus.subscribe();
    let mut b = bus.subscribe();
    let mut c = bus.subscribe();

    assert_eq!(bus.publish(event("broadcast")), 3);

    for subscription in [&mut a, &mut b, &mut c] {
        let received = subscription.try_recv().unwrap();
        assert_eq!(received.message, "broadcast");
        assert_eq!(received.kind, ThreatKind::FraudAnomaly);
    }
}

#[test]
fn test_slow_subscriber_isolation() {
    let metrics = Metrics::new();
    let bus = EventBus::new(1, metrics.clone());

    let _stalled = bus.subscribe();
    let mut healthy = bus.subscribe();

    // First publish fills the stalled subscriber's single-slot buffer.
    assert_eq!(bus.publish(event("one")), 2);
    healthy.try_recv().unwrap();

    // Second publish overflows it; the stalled subscriber is dropped and
    // the healthy one is unaffected.
    assert_eq!(bus.publish(event("two")), 1);
    assert_eq!(healthy.try_recv().unwrap().message, "two");
    assert_eq!(bus.subscriber_count(), 1);
    assert_eq!(metrics.subscribers_dropped(), 1);
}

#[tokio::test]
async fn test_async_subscriber_stream() {
    let bus = EventBus::new(16, Metrics::new());
    let mut subscription = bus.subscribe();

    let publisher = {
        let bus = bus.clone();
        tokio::spawn(async move {
            for i in 0..5 {
                bus.publish(event(&format!("event-{}", i)));
            }
        })
    };

    publisher.await.unwrap();

    for i in 0..5 {
        let received = subscription.recv().await.unwrap();
        assert_eq!(received.message, format!("event-{}", i));
    }
}

#[test]
fn test_publish_while_subscribers_churn() {
    use std::thread;

    let bus = EventBus::new(8, Metrics::new());
    let mut handles = vec![];

    for _ in 0..4 {
        let b = bus.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..100 {
                let subscription = b.subscribe();
                drop(subscription);
            }
        }));
    }
    for _ in 0..2 {
        let b = bus.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..200 {
                b.publish(event("churn"));
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(bus.subscriber_count(), 0);
}
