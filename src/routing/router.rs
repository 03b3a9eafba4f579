//! Reply delivery back to the originating channel.

use std::sync::Arc;

use crate::bus::publisher::BusPublisher;
use crate::config::{BusConfig, ReplyConfig};
use crate::observability::metrics;
use crate::routing::envelope::{Channel, DeliveryError, ReplyEnvelope};
use crate::routing::telephony::Telephony;

/// Routes each reply to the channel its request came from.
///
/// A failed delivery is logged and counted, never retried, and never feeds
/// back into the pipeline.
#[derive(Clone)]
pub struct ReplyRouter {
    telephony: Arc<dyn Telephony>,
    bus: Arc<dyn BusPublisher>,
    response_topic: String,
    max_length: usize,
}

impl ReplyRouter {
    /// Create a router.
    pub fn new(
        telephony: Arc<dyn Telephony>,
        bus: Arc<dyn BusPublisher>,
        response_topic: impl Into<String>,
        max_length: usize,
    ) -> Self {
        Self {
            telephony,
            bus,
            response_topic: response_topic.into(),
            max_length,
        }
    }

    /// Create a router from the bus and reply configuration sections.
    pub fn from_config(
        telephony: Arc<dyn Telephony>,
        bus: Arc<dyn BusPublisher>,
        bus_config: &BusConfig,
        replies: &ReplyConfig,
    ) -> Self {
        Self::new(telephony, bus, bus_config.response_topic(), replies.max_length)
    }

    /// Address a reply to `sender` on `channel`.
    pub fn envelope(&self, channel: Channel, sender: &str, message: String) -> ReplyEnvelope {
        let destination = match channel {
            Channel::Webhook => sender.to_string(),
            Channel::Bus => self.response_topic.clone(),
        };
        ReplyEnvelope {
            channel,
            destination,
            message,
        }
    }

    /// Deliver a reply.
    pub async fn deliver(&self, envelope: ReplyEnvelope) -> Result<(), DeliveryError> {
        let result = match envelope.channel {
            Channel::Webhook => {
                let text = truncate_chars(&envelope.message, self.max_length);
                self.telephony.send_message(&envelope.destination, text).await
            }
            Channel::Bus => {
                self.bus
                    .publish(&envelope.destination, &envelope.message)
                    .await
            }
        };

        if let Err(e) = &result {
            metrics::record_reply_failure(envelope.channel.as_str());
            tracing::error!(
                channel = %envelope.channel,
                destination = %envelope.destination,
                error = %e,
                "Reply delivery failed"
            );
        }
        result
    }
}

/// Longest prefix of `text` with at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
