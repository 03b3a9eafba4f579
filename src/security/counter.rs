//! Shared counter store backing the rate-limit windows.
//!
//! Both operations are single atomic primitives on the store; callers never
//! read-then-write.

use async_trait::async_trait;
use dashmap::DashMap;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Counter store failure.
#[derive(Debug, Error)]
pub enum CounterError {
    #[error("counter store error: {0}")]
    Backend(String),
}

impl From<redis::RedisError> for CounterError {
    fn from(e: redis::RedisError) -> Self {
        CounterError::Backend(e.to_string())
    }
}

/// Counters with time-to-live, shared by every request.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Current value of `key`; zero when absent or expired.
    async fn get(&self, key: &str) -> Result<u64, CounterError>;

    /// Atomically increment `key` and (re)set its time-to-live.
    /// Returns the new value.
    async fn increment_and_expire(&self, key: &str, ttl: Duration) -> Result<u64, CounterError>;
}

/// Counter store on a shared Redis instance.
#[derive(Clone)]
pub struct RedisCounterStore {
    conn: MultiplexedConnection,
}

impl RedisCounterStore {
    /// Connect to Redis.
    pub async fn connect(redis_url: &str) -> Result<Self, CounterError> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        tracing::info!("Connected rate-limit counter store");
        Ok(Self { conn })
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn get(&self, key: &str) -> Result<u64, CounterError> {
        let mut conn = self.conn.clone();
        let value: Option<u64> = conn.get(key).await?;
        Ok(value.unwrap_or(0))
    }

    async fn increment_and_expire(&self, key: &str, ttl: Duration) -> Result<u64, CounterError> {
        let mut conn = self.conn.clone();
        // MULTI INCR EXPIRE EXEC
        let (count,): (u64,) = redis::pipe()
            .atomic()
            .incr(key, 1u64)
            .expire(key, ttl.as_secs().max(1) as i64)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(count)
    }
}

struct Window {
    count: u64,
    expires_at: Instant,
}

/// In-process counter store for single-instance deployments and tests.
#[derive(Clone, Default)]
pub struct MemoryCounterStore {
    windows: Arc<DashMap<String, Window>>,
}

impl MemoryCounterStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop expired windows.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.windows.retain(|_, w| w.expires_at > now);
    }

    /// Number of tracked windows, live or not yet purged.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Whether no window is tracked.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn get(&self, key: &str) -> Result<u64, CounterError> {
        let now = Instant::now();
        Ok(self
            .windows
            .get(key)
            .filter(|w| w.expires_at > now)
            .map(|w| w.count)
            .unwrap_or(0))
    }

    async fn increment_and_expire(&self, key: &str, ttl: Duration) -> Result<u64, CounterError> {
        let now = Instant::now();
        // The entry guard holds the shard lock for the whole update.
        let mut window = self.windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            expires_at: now,
        });
        if window.expires_at <= now {
            window.count = 0;
        }
        window.count += 1;
        window.expires_at = now + ttl;
        Ok(window.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_absent_key_reads_zero() {
        let store = MemoryCounterStore::new();
        assert_eq!(store.get("rate_limit:nobody").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_increment_counts_up() {
        let store = MemoryCounterStore::new();
        let ttl = Duration::from_secs(60);
        assert_eq!(store.increment_and_expire("k", ttl).await.unwrap(), 1);
        assert_eq!(store.increment_and_expire("k", ttl).await.unwrap(), 2);
        assert_eq!(store.get("k").await.unwrap(), 2);
        assert_eq!(store.get("other").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_window_resets_after_ttl() {
        let store = MemoryCounterStore::new();
        let ttl = Duration::from_millis(30);
        store.increment_and_expire("k", ttl).await.unwrap();
        store.increment_and_expire("k", ttl).await.unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(store.get("k").await.unwrap(), 0);
        assert_eq!(store.increment_and_expire("k", ttl).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = MemoryCounterStore::new();
        store
            .increment_and_expire("short", Duration::from_millis(10))
            .await
            .unwrap();
        store
            .increment_and_expire("long", Duration::from_secs(60))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        store.purge_expired();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let store = MemoryCounterStore::new();
        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .increment_and_expire("shared", Duration::from_secs(60))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.get("shared").await.unwrap(), 50);
    }
}
