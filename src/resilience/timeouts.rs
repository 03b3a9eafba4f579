//! Timeout enforcement.
//!
//! # Responsibilities
//! - Put a deadline on external calls (RPC broadcast, provider API)
//! - Keep timeout errors distinct from the call's own errors

use std::future::Future;
use std::time::Duration;

pub use tokio::time::error::Elapsed;

/// Run `fut` with a deadline.
///
/// The outer `Result` is `Err` only when the deadline passed first.
pub async fn with_deadline<F, T>(deadline: Duration, fut: F) -> Result<T, Elapsed>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(deadline, fut).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes_within_deadline() {
        let result = with_deadline(Duration::from_secs(1), async { 42 }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_deadline_elapses() {
        let result = with_deadline(Duration::from_millis(10), std::future::pending::<()>()).await;
        assert!(result.is_err());
    }
}
