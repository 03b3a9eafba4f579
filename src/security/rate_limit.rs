//! Per-sender fixed-window rate limiting on the shared counter store.

use std::sync::Arc;
use std::time::Duration;

use crate::config::RateLimitConfig;
use crate::security::counter::{CounterError, CounterStore};

/// Key prefix for sender windows in the counter store.
pub const KEY_PREFIX: &str = "rate_limit:";

/// Counter store key for `sender`.
pub fn window_key(sender: &str) -> String {
    format!("{}{}", KEY_PREFIX, sender)
}

/// Outcome of a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quota {
    /// Sender may proceed; `used` requests already counted this window.
    Available { used: u64 },
    /// Sender has used the whole window.
    Exhausted { used: u64 },
}

/// Fixed-window limiter.
///
/// Checking never consumes quota; only [`RateLimiter::record`] does, and the
/// dispatcher calls it after a transaction has been submitted.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    calls: u64,
    window: Duration,
}

impl RateLimiter {
    /// Create a limiter allowing `calls` accepted requests per `window`.
    pub fn new(store: Arc<dyn CounterStore>, calls: u64, window: Duration) -> Self {
        Self {
            store,
            calls,
            window,
        }
    }

    /// Create a limiter from the `[rate_limit]` configuration section.
    pub fn from_config(store: Arc<dyn CounterStore>, config: &RateLimitConfig) -> Self {
        Self::new(store, config.calls, Duration::from_secs(config.period_secs))
    }

    /// Read the sender's window without changing it.
    pub async fn check(&self, sender: &str) -> Result<Quota, CounterError> {
        let used = self.store.get(&window_key(sender)).await?;
        if used >= self.calls {
            Ok(Quota::Exhausted { used })
        } else {
            Ok(Quota::Available { used })
        }
    }

    /// Count one accepted request against the sender's window.
    pub async fn record(&self, sender: &str) -> Result<u64, CounterError> {
        self.store
            .increment_and_expire(&window_key(sender), self.window)
            .await
    }
}
