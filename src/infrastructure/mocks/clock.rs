//! Mock clock for testing.

use crate::application::ports::Clock;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Clock whose time only moves when a test says so.
///
/// Clones share the same underlying time value, so advancing through one
/// handle is visible through all of them. Thread-safe.
///
/// ```
/// use riskgate::infrastructure::mocks::MockClock;
/// use riskgate::application::ports::Clock;
/// use std::time::{Duration, Instant};
///
/// let start = Instant::now();
/// let clock = MockClock::new(start);
/// assert_eq!(clock.now(), start);
///
/// clock.advance(Duration::from_secs(2));
/// assert_eq!(clock.now(), start + Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct MockClock {
    current: Arc<Mutex<Instant>>,
}

impl MockClock {
    /// Create a mock clock frozen at `start`.
    pub fn new(start: Instant) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    /// Move the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        let mut current = self
            .current
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock");
        *current += duration;
    }

    /// Jump the clock to a specific instant.
    pub fn set(&self, instant: Instant) {
        let mut current = self
            .current
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock");
        *current = instant;
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        *self
            .current
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_and_set() {
        let start = Instant::now();
        let clock = MockClock::new(start);

        assert_eq!(clock.now(), start);

        clock.advance(Duration::from_secs(10));
        assert_eq!(clock.now(), start + Duration::from_secs(10));

        let target = start + Duration::from_secs(100);
        clock.set(target);
        assert_eq!(clock.now(), target);
    }

    #[test]
    fn test_clones_share_time() {
        let start = Instant::now();
        let clock = MockClock::new(start);
        let other = clock.clone();

        other.advance(Duration::from_secs(5));
        assert_eq!(clock.now(), start + Duration::from_secs(5));
    }
}
