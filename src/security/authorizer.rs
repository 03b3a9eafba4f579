//! Authorization: registered sender and remaining quota.

use std::sync::Arc;

use thiserror::Error;

use crate::blockchain::wallet::Credential;
use crate::command::Command;
use crate::observability::metrics;
use crate::security::credentials::CredentialStore;
use crate::security::rate_limit::{Quota, RateLimiter};

/// Why a parsed command may not execute.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credential registered for the sender.
    #[error("unknown sender")]
    UnknownSender,

    /// The sender used the whole window.
    #[error("rate limited after {used} requests")]
    RateLimited { used: u64 },

    /// Quota could not be read; the request is refused.
    #[error("counter store unavailable: {0}")]
    CounterUnavailable(String),
}

/// Decides whether a sender may execute a command now.
#[derive(Clone)]
pub struct Authorizer {
    credentials: Arc<CredentialStore>,
    limiter: RateLimiter,
}

impl Authorizer {
    /// Create an authorizer.
    pub fn new(credentials: Arc<CredentialStore>, limiter: RateLimiter) -> Self {
        Self {
            credentials,
            limiter,
        }
    }

    /// Return the sender's credential if it is registered and has quota left.
    ///
    /// Reads the counter store but never writes it.
    pub async fn authorize(&self, sender: &str, _command: &Command) -> Result<Credential, AuthError> {
        let credential = self
            .credentials
            .get(sender)
            .ok_or(AuthError::UnknownSender)?;

        match self.limiter.check(sender).await {
            Ok(Quota::Available { .. }) => Ok(credential.clone()),
            Ok(Quota::Exhausted { used }) => {
                metrics::record_rate_limited();
                Err(AuthError::RateLimited { used })
            }
            Err(e) => {
                metrics::record_counter_failure("read");
                Err(AuthError::CounterUnavailable(e.to_string()))
            }
        }
    }

    /// Consume one unit of the sender's quota after a successful submission.
    pub async fn record_accepted(&self, sender: &str) {
        match self.limiter.record(sender).await {
            Ok(count) => {
                tracing::debug!(sender = %sender, count, "Rate window updated");
            }
            Err(e) => {
                // The transaction is already on its way; only the count is lost.
                metrics::record_counter_failure("increment");
                tracing::error!(sender = %sender, error = %e, "Failed to record accepted request");
            }
        }
    }
}
