//! Retry budget, backoff schedule and per-attempt timeout.

use std::time::Duration;

/// How many times to retry and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (attempt indices 0..=max_retries)
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    /// Delay before `attempt` (0-based).
    ///
    /// `min(base * 2^(attempt - 1), max)`; the first attempt never waits.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(attempt - 1);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(5000),
            attempt_timeout: Duration::from_millis(10_000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy::default();
        let delays: Vec<u128> = (0..6).map(|a| policy.backoff_delay(a).as_millis()).collect();
        assert_eq!(delays, vec![0, 1000, 2000, 4000, 5000, 5000]);
    }

    #[test]
    fn test_backoff_does_not_overflow() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(200), Duration::from_millis(5000));
    }
}
