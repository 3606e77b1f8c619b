use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Bounded exponential backoff for (re)connecting to the database.
///
/// Attempt `n` waits `min(base * 2^n, max)`. With the defaults the retries
/// wait 2s, 4s, 8s, 16s and 30s before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
        }
    }
}

impl ReconnectPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Claim the next retry slot. Returns the attempt number and how long to
    /// wait before it, or `None` once `max_retries` slots have been used.
    pub fn next_retry(&self, attempts: &AtomicU32) -> Option<(u32, Duration)> {
        let claimed = attempts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.max_retries).then_some(n + 1)
            })
            .ok()?;
        let attempt = claimed + 1;
        Some((attempt, self.delay_for(attempt)))
    }
}
