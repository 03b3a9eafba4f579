//! Reconnect delays: exponential growth, capped, with up to 10% jitter.

use rand::Rng;
use std::time::Duration;

/// Delay schedule for re-establishing a lost connection.
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    base: Duration,
    max: Duration,
    failures: u32,
}

impl ReconnectBackoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            failures: 0,
        }
    }

    /// Record a failure and return how long to wait before the next try.
    pub fn next_delay(&mut self) -> Duration {
        let doublings = self.failures.min(31);
        self.failures = self.failures.saturating_add(1);

        let delay = self.base.saturating_mul(1u32 << doublings).min(self.max);
        let spread = delay.as_millis() as u64 / 10;
        if spread == 0 {
            return delay;
        }
        delay + Duration::from_millis(rand::thread_rng().gen_range(0..spread))
    }

    /// Start over after a connection that worked.
    pub fn reset(&mut self) {
        self.failures = 0;
    }

    /// Consecutive failures since the last reset.
    pub fn failures(&self) -> u32 {
        self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backoff() -> ReconnectBackoff {
        ReconnectBackoff::new(Duration::from_millis(100), Duration::from_millis(1000))
    }

    #[test]
    fn test_delays_double_until_capped() {
        let mut b = backoff();
        let first = b.next_delay();
        assert!(first >= Duration::from_millis(100) && first < Duration::from_millis(110));

        let second = b.next_delay();
        assert!(second >= Duration::from_millis(200) && second < Duration::from_millis(220));

        for _ in 0..40 {
            let d = b.next_delay();
            assert!(d >= Duration::from_millis(1000) && d < Duration::from_millis(1100));
        }
    }

    #[test]
    fn test_reset_returns_to_base() {
        let mut b = backoff();
        b.next_delay();
        b.next_delay();
        assert_eq!(b.failures(), 2);

        b.reset();
        assert_eq!(b.failures(), 0);
        assert!(b.next_delay() < Duration::from_millis(110));
    }
}
