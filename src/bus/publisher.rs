//! Publishing replies on the message bus.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::routing::DeliveryError;

/// Capability to publish a payload on a topic.
#[async_trait]
pub trait BusPublisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), DeliveryError>;
}

/// Redis `PUBLISH` backed publisher.
#[derive(Clone)]
pub struct RedisBusPublisher {
    conn: MultiplexedConnection,
}

impl RedisBusPublisher {
    /// Connect to the broker.
    pub async fn connect(redis_url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl BusPublisher for RedisBusPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), DeliveryError> {
        let mut conn = self.conn.clone();
        let receivers: u64 = conn
            .publish(topic, payload)
            .await
            .map_err(|e| DeliveryError::Bus(e.to_string()))?;
        tracing::debug!(topic = %topic, receivers, "Published reply");
        Ok(())
    }
}

/// Publisher used when the bus channel is disabled. No bus request can
/// arrive then, so any publish is a wiring error.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledBus;

#[async_trait]
impl BusPublisher for DisabledBus {
    async fn publish(&self, topic: &str, _payload: &str) -> Result<(), DeliveryError> {
        Err(DeliveryError::Bus(format!(
            "bus channel disabled, cannot publish to {}",
            topic
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_bus_refuses() {
        let result = DisabledBus.publish("payment/requests/response", "x").await;
        assert!(matches!(result, Err(DeliveryError::Bus(_))));
    }

    #[tokio::test]
    async fn test_connect_to_unreachable_broker_fails() {
        assert!(RedisBusPublisher::connect("redis://127.0.0.1:9/").await.is_err());
    }
}
