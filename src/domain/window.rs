//! Sliding-window request tracking for a single identity.
//!
//! A [`RateWindow`] holds the timestamps of recent calls from one source
//! identity. Recording a sample appends the new timestamp and eagerly prunes
//! everything that has fallen out of the trailing window, so the window
//! never holds stale entries between evaluations.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Callers treat an identity as anomalous when its threat score is strictly
/// above this value, i.e. strictly more than `threshold_count` calls landed
/// inside the window.
pub const RATE_BLOCK_THRESHOLD: f64 = 50.0;

/// Rate-tracking configuration shared by all identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatePolicy {
    /// Length of the trailing window.
    pub window: Duration,
    /// Number of calls inside the window that maps to a score of exactly 50.
    pub threshold_count: usize,
}

impl Default for RatePolicy {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(1),
            threshold_count: 20,
        }
    }
}

impl RatePolicy {
    /// Threat score for `count` calls observed inside the window.
    ///
    /// `(count / threshold_count) * 50.0` — exactly `threshold_count` calls
    /// score 50, and the score is unbounded above for larger bursts. The
    /// action threshold is the caller's decision, not the tracker's.
    pub fn threat_score(&self, count: usize) -> f64 {
        (count as f64 / self.threshold_count as f64) * 50.0
    }
}

/// The per-identity window state: an ordered sequence of call timestamps,
/// all within the trailing window at evaluation time.
#[derive(Debug, Clone)]
pub struct RateWindow {
    timestamps: VecDeque<Instant>,
    last_seen: Instant,
}

impl RateWindow {
    /// Create an empty window. Created lazily on the first sample for an
    /// identity.
    pub fn new(now: Instant) -> Self {
        Self {
            timestamps: VecDeque::new(),
            last_seen: now,
        }
    }

    /// Record a call at `now` and return the number of calls remaining in
    /// the trailing window, the new sample included.
    pub fn record(&mut self, now: Instant, window: Duration) -> usize {
        self.last_seen = now;
        self.timestamps.push_back(now);

        while let Some(&oldest) = self.timestamps.front() {
            if now.saturating_duration_since(oldest) > window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }

        self.timestamps.len()
    }

    /// Number of samples currently retained.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether the window holds no samples.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// When this identity was last observed. Used for LRU eviction.
    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_counts_one() {
        let now = Instant::now();
        let mut window = RateWindow::new(now);
        assert_eq!(window.record(now, Duration::from_secs(1)), 1);
    }

    #[test]
    fn test_samples_inside_window_accumulate() {
        let now = Instant::now();
        let mut window = RateWindow::new(now);
        let span = Duration::from_secs(1);

        for i in 1..=5 {
            let count = window.record(now + Duration::from_millis(i * 10), span);
            assert_eq!(count, i as usize);
        }
    }

    #[test]
    fn test_old_samples_are_pruned() {
        let now = Instant::now();
        let mut window = RateWindow::new(now);
        let span = Duration::from_secs(1);

        window.record(now, span);
        window.record(now + Duration::from_millis(100), span);

        // Two seconds later both earlier samples are outside the window.
        let count = window.record(now + Duration::from_secs(2), span);
        assert_eq!(count, 1);
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_sample_exactly_at_window_edge_is_kept() {
        let now = Instant::now();
        let mut window = RateWindow::new(now);
        let span = Duration::from_secs(1);

        window.record(now, span);
        // Exactly window seconds later: the old sample is not *older than*
        // the window, so it survives.
        let count = window.record(now + span, span);
        assert_eq!(count, 2);
    }

    #[test]
    fn test_threat_score_formula() {
        let policy = RatePolicy::default();
        assert!((policy.threat_score(20) - 50.0).abs() < f64::EPSILON);
        assert!((policy.threat_score(10) - 25.0).abs() < f64::EPSILON);
        assert!(policy.threat_score(21) > RATE_BLOCK_THRESHOLD);
        // Unbounded above: no clamp at this stage.
        assert!((policy.threat_score(80) - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_first_call_score_negligible() {
        let policy = RatePolicy::default();
        assert!(policy.threat_score(1) <= 2.5);
    }

    #[test]
    fn test_last_seen_tracks_latest_record() {
        let now = Instant::now();
        let mut window = RateWindow::new(now);
        let later = now + Duration::from_secs(3);

        window.record(later, Duration::from_secs(1));
        assert_eq!(window.last_seen(), later);
    }
}
