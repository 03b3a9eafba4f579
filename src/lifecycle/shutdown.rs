//! Shutdown coordination for the gateway.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::config::GatewayConfig;

/// Slack added on top of the slowest path a single request can take.
const DRAIN_GRACE: Duration = Duration::from_secs(5);

/// RPC reads a request makes before its transaction is submitted.
const READS_BEFORE_SUBMIT: u32 = 3;

/// Coordinator for graceful shutdown.
///
/// The webhook server and the bus listener each hold a receiver. Once both
/// have stopped, the dispatcher is drained so requests already accepted
/// still get their reply; see [`drain_deadline`].
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    triggered: Arc<AtomicBool>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            triggered: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal. Later calls are no-ops.
    pub fn trigger(&self) {
        if self.triggered.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!(listeners = self.tx.receiver_count(), "Shutdown triggered");
        let _ = self.tx.send(());
    }

    /// Whether shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// How long shutdown waits for in-flight requests.
///
/// Covers the reads before submission, the submit deadline itself and one
/// reply call, so a request that was accepted just before the signal can
/// still finish.
pub fn drain_deadline(config: &GatewayConfig) -> Duration {
    let rpc = Duration::from_secs(config.blockchain.rpc_timeout_secs);
    Duration::from_secs(config.blockchain.submit_timeout_secs)
        + rpc * READS_BEFORE_SUBMIT
        + Duration::from_secs(config.telephony.timeout_secs)
        + DRAIN_GRACE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_all_subscribers_notified() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.subscribe();
        let mut b = shutdown.clone().subscribe();

        shutdown.trigger();
        assert!(a.recv().await.is_ok());
        assert!(b.recv().await.is_ok());
        assert!(shutdown.is_triggered());
    }

    #[test]
    fn test_drain_deadline_outlasts_submit_timeout() {
        let mut config = GatewayConfig::default();
        config.blockchain.submit_timeout_secs = 30;
        config.blockchain.rpc_timeout_secs = 10;
        config.telephony.timeout_secs = 10;

        let deadline = drain_deadline(&config);
        assert_eq!(deadline, Duration::from_secs(30 + 30 + 10 + 5));
        assert!(deadline > Duration::from_secs(config.blockchain.submit_timeout_secs));
    }

    #[tokio::test]
    async fn test_trigger_is_idempotent() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        shutdown.trigger();
        shutdown.trigger();

        assert!(rx.recv().await.is_ok());
        assert!(rx.try_recv().is_err());
    }
}
