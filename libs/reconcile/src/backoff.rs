//! Per-record requeue backoff.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Tracks failed passes per record and when each may run again.
///
/// Delays double with every consecutive failure, starting at `base` and
/// capped at `max`. A successful pass clears the record.
#[derive(Debug, Clone)]
pub struct BackoffTracker {
    base: Duration,
    max: Duration,

    /// record key -> (consecutive failures, not before).
    failures: BTreeMap<String, (u32, Instant)>,
}

impl BackoffTracker {
    /// Create a new tracker.
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            failures: BTreeMap::new(),
        }
    }

    /// Record a failed pass. Returns the delay before the next attempt.
    pub fn record_failure(&mut self, key: &str) -> Duration {
        self.record_failure_at(key, Instant::now())
    }

    fn record_failure_at(&mut self, key: &str, now: Instant) -> Duration {
        let (count, not_before) = self
            .failures
            .entry(key.to_string())
            .or_insert((0, now));

        *count = count.saturating_add(1);
        let delay = delay_for(self.base, self.max, *count);
        *not_before = now + delay;
        delay
    }

    /// Consecutive failures recorded for a key.
    pub fn failures(&self, key: &str) -> u32 {
        self.failures.get(key).map_or(0, |(count, _)| *count)
    }

    /// Returns true if the key may be reconciled now.
    pub fn is_due(&self, key: &str) -> bool {
        self.is_due_at(key, Instant::now())
    }

    fn is_due_at(&self, key: &str, now: Instant) -> bool {
        self.failures
            .get(key)
            .map_or(true, |(_, not_before)| now >= *not_before)
    }

    /// Clear tracking for a key (on success).
    pub fn clear(&mut self, key: &str) {
        self.failures.remove(key);
    }

    /// Drop keys that are no longer present.
    pub fn retain_keys<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.failures.retain(|k, _| keep(k));
    }
}

fn delay_for(base: Duration, max: Duration, failures: u32) -> Duration {
    let exponent = failures.saturating_sub(1).min(31);
    base.saturating_mul(1u32 << exponent).min(max)
}
