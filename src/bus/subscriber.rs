//! Bus channel adapter: one dispatch per inbound message.

use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::config::BusConfig;
use crate::dispatch::Dispatcher;
use crate::resilience::backoff::ReconnectBackoff;
use crate::routing::Channel;

const RECONNECT_BASE: Duration = Duration::from_millis(500);
const RECONNECT_MAX: Duration = Duration::from_secs(30);

/// A request taken off the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusRequest {
    /// Topic the message arrived on; used as the sender identity.
    pub sender: String,
    pub body: String,
}

/// Subscribes to the request topic and feeds the dispatcher.
pub struct BusListener {
    config: BusConfig,
    response_topic: String,
    dispatcher: Arc<Dispatcher>,
}

impl BusListener {
    /// Create a listener.
    pub fn new(config: BusConfig, dispatcher: Arc<Dispatcher>) -> Self {
        let response_topic = config.response_topic();
        Self {
            config,
            response_topic,
            dispatcher,
        }
    }

    /// Turn a raw bus message into a request, skipping our own replies.
    pub fn accept(&self, topic: &str, payload: &[u8]) -> Option<BusRequest> {
        if topic == self.response_topic {
            return None;
        }
        match std::str::from_utf8(payload) {
            Ok(body) => Some(BusRequest {
                sender: topic.to_string(),
                body: body.to_string(),
            }),
            Err(_) => {
                tracing::warn!(topic = %topic, "Dropping non-UTF-8 bus message");
                None
            }
        }
    }

    /// Run until shutdown, reconnecting with backoff when the broker drops.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut backoff = ReconnectBackoff::new(RECONNECT_BASE, RECONNECT_MAX);
        loop {
            tokio::select! {
                result = self.listen(&mut backoff) => {
                    match result {
                        Ok(()) => tracing::warn!("Bus subscription ended"),
                        Err(e) => tracing::error!(error = %e, "Bus subscription failed"),
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Bus listener stopped");
                    return;
                }
            }

            let delay = backoff.next_delay();
            tracing::info!(failures = backoff.failures(), delay = ?delay, "Reconnecting to bus");
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.recv() => {
                    tracing::info!("Bus listener stopped");
                    return;
                }
            }
        }
    }

    async fn listen(&self, backoff: &mut ReconnectBackoff) -> Result<(), redis::RedisError> {
        let client = redis::Client::open(self.config.redis_url.as_str())?;
        let mut pubsub = client.get_async_pubsub().await?;
        if self.config.is_pattern() {
            pubsub.psubscribe(&self.config.request_topic).await?;
        } else {
            pubsub.subscribe(&self.config.request_topic).await?;
        }
        tracing::info!(topic = %self.config.request_topic, "Subscribed to bus");
        backoff.reset();

        let mut messages = pubsub.on_message();
        while let Some(msg) = messages.next().await {
            if let Some(request) = self.accept(msg.get_channel_name(), msg.get_payload_bytes()) {
                // Each message is its own unit of work.
                drop(self.dispatcher.spawn(request.sender, request.body, Channel::Bus));
            }
        }
        Ok(())
    }
}
