//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::command::Action;

/// Root configuration for the payment gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Inbound webhook listener (telephony channel).
    pub webhook: WebhookConfig,

    /// Outbound telephony provider settings.
    pub telephony: TelephonyConfig,

    /// Publish/subscribe channel settings.
    pub bus: BusConfig,

    /// Per-sender rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Command grammar policy.
    pub commands: CommandConfig,

    /// Reply formatting.
    pub replies: ReplyConfig,

    /// Blockchain integration settings.
    pub blockchain: BlockchainConfig,

    /// Registered senders and where their signing keys live.
    pub senders: Vec<SenderConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Webhook listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,

    /// Route the provider posts inbound messages to.
    pub path: String,

    /// Public URL the provider signs requests against.
    pub public_url: Option<String>,

    /// Reject requests without a valid provider signature.
    pub verify_signatures: bool,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
            path: "/sms".to_string(),
            public_url: None,
            verify_signatures: true,
            max_body_bytes: 64 * 1024,
            request_timeout_secs: 60,
        }
    }
}

/// Telephony provider (REST messaging API) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelephonyConfig {
    /// Provider account identifier.
    pub account_sid: String,

    /// Number replies are sent from.
    pub from_number: String,

    /// Environment variable holding the provider auth token.
    pub auth_token_env: String,

    /// REST API base URL.
    pub api_base_url: String,

    /// Outbound request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TelephonyConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            from_number: String::new(),
            auth_token_env: "TWILIO_AUTH_TOKEN".to_string(),
            api_base_url: "https://api.twilio.com".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Message bus configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BusConfig {
    /// Enable the bus channel.
    pub enabled: bool,

    /// Broker URL.
    pub redis_url: String,

    /// Topic requests arrive on. A `*` makes it a pattern subscription.
    pub request_topic: String,

    /// Suffix appended to the request topic to form the response topic.
    pub response_suffix: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            request_topic: "payment/requests".to_string(),
            response_suffix: "/response".to_string(),
        }
    }
}

impl BusConfig {
    /// Topic replies are published to.
    ///
    /// A trailing `/*` wildcard on the request topic is dropped first, so
    /// `payment/requests/*` still answers on `payment/requests/response`.
    pub fn response_topic(&self) -> String {
        let base = self
            .request_topic
            .strip_suffix("/*")
            .unwrap_or(&self.request_topic);
        format!("{}{}", base, self.response_suffix)
    }

    /// Whether the request topic must be subscribed as a pattern.
    pub fn is_pattern(&self) -> bool {
        self.request_topic.contains('*')
    }
}

/// Where rate-limit windows are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterBackend {
    /// Shared Redis instance (multi-process safe).
    Redis,
    /// In-process map (single instance only).
    Memory,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum accepted requests per sender per window.
    pub calls: u64,

    /// Window length in seconds.
    pub period_secs: u64,

    /// Counter store backend.
    pub backend: CounterBackend,

    /// Redis URL when `backend = "redis"`.
    pub redis_url: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            calls: 10,
            period_secs: 60,
            backend: CounterBackend::Redis,
            redis_url: "redis://127.0.0.1:6379".to_string(),
        }
    }
}

/// Command grammar policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Actions senders may use.
    pub allowed_actions: Vec<Action>,

    /// Largest amount accepted, in whole native units.
    pub max_amount: Decimal,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            allowed_actions: vec![Action::Pay, Action::Transfer],
            max_amount: Decimal::from(100),
        }
    }
}

/// Reply formatting.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReplyConfig {
    /// Maximum characters in a telephony reply.
    pub max_length: usize,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self { max_length: 160 }
    }
}

/// Blockchain integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Expected chain ID (e.g., 1 for Ethereum mainnet, 31337 for local Anvil).
    pub chain_id: u64,

    /// RPC read timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Deadline for the broadcast call in seconds.
    pub submit_timeout_secs: u64,

    /// Maximum gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: Option<u64>,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 1,
            rpc_timeout_secs: 10,
            submit_timeout_secs: 30,
            max_gas_price_gwei: None,
        }
    }
}

/// A registered sender.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SenderConfig {
    /// Phone number or bus topic the sender is identified by.
    pub id: String,

    /// Environment variable holding the sender's hex private key.
    pub private_key_env: String,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_deployment() {
        let config = GatewayConfig::default();
        assert_eq!(config.rate_limit.calls, 10);
        assert_eq!(config.rate_limit.period_secs, 60);
        assert_eq!(config.commands.max_amount, Decimal::from(100));
        assert_eq!(
            config.commands.allowed_actions,
            vec![Action::Pay, Action::Transfer]
        );
        assert_eq!(config.replies.max_length, 160);
        assert!(config.senders.is_empty());
    }

    #[test]
    fn test_response_topic_derivation() {
        let mut bus = BusConfig::default();
        assert_eq!(bus.response_topic(), "payment/requests/response");
        assert!(!bus.is_pattern());

        bus.request_topic = "payment/requests/*".to_string();
        assert_eq!(bus.response_topic(), "payment/requests/response");
        assert!(bus.is_pattern());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [commands]
            allowed_actions = ["PAY"]
            max_amount = "2.5"

            [rate_limit]
            backend = "memory"

            [[senders]]
            id = "+15551234567"
            private_key_env = "ALICE_KEY"
            "#,
        )
        .unwrap();

        assert_eq!(config.commands.allowed_actions, vec![Action::Pay]);
        assert_eq!(config.commands.max_amount, Decimal::new(25, 1));
        assert_eq!(config.rate_limit.backend, CounterBackend::Memory);
        assert_eq!(config.rate_limit.calls, 10);
        assert_eq!(config.senders.len(), 1);
        assert_eq!(config.webhook.path, "/sms");
    }
}
