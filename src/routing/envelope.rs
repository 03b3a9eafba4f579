//! Reply envelope and channel identity.

use std::fmt;

use thiserror::Error;

/// Inbound channel a request arrived on; replies go back the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Telephony provider webhook (SMS).
    Webhook,
    /// Publish/subscribe message bus.
    Bus,
}

impl Channel {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Webhook => "webhook",
            Channel::Bus => "bus",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound reply. Produced once per inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyEnvelope {
    pub channel: Channel,
    /// Phone number (webhook) or response topic (bus).
    pub destination: String,
    pub message: String,
}

/// A reply could not be delivered.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("telephony send failed: {0}")]
    Telephony(String),

    #[error("bus publish failed: {0}")]
    Bus(String),

    #[error("invalid destination '{0}'")]
    InvalidDestination(String),
}
