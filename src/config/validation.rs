//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, amounts positive)
//! - Check sender registrations are unique
//! - Check URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use rust_decimal::Decimal;

use crate::config::schema::{CounterBackend, GatewayConfig};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.webhook.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "webhook.bind_address",
            "must be a socket address",
        ));
    }
    if !config.webhook.path.starts_with('/') {
        errors.push(ValidationError::new("webhook.path", "must start with '/'"));
    }
    match &config.webhook.public_url {
        Some(public_url) if url::Url::parse(public_url).is_err() => {
            errors.push(ValidationError::new("webhook.public_url", "invalid URL"));
        }
        None if config.webhook.verify_signatures => {
            errors.push(ValidationError::new(
                "webhook.public_url",
                "required when verify_signatures is enabled",
            ));
        }
        _ => {}
    }

    if url::Url::parse(&config.telephony.api_base_url).is_err() {
        errors.push(ValidationError::new("telephony.api_base_url", "invalid URL"));
    }

    if config.bus.enabled {
        if config.bus.request_topic.is_empty() {
            errors.push(ValidationError::new("bus.request_topic", "must not be empty"));
        }
        if config.bus.response_suffix.is_empty() {
            errors.push(ValidationError::new(
                "bus.response_suffix",
                "must not be empty",
            ));
        }
    }

    if config.rate_limit.calls == 0 {
        errors.push(ValidationError::new("rate_limit.calls", "must be at least 1"));
    }
    if config.rate_limit.period_secs == 0 {
        errors.push(ValidationError::new(
            "rate_limit.period_secs",
            "must be at least 1",
        ));
    }
    if config.rate_limit.backend == CounterBackend::Redis && config.rate_limit.redis_url.is_empty()
    {
        errors.push(ValidationError::new(
            "rate_limit.redis_url",
            "required for the redis backend",
        ));
    }

    if config.commands.allowed_actions.is_empty() {
        errors.push(ValidationError::new(
            "commands.allowed_actions",
            "must name at least one action",
        ));
    }
    if config.commands.max_amount <= Decimal::ZERO {
        errors.push(ValidationError::new(
            "commands.max_amount",
            "must be greater than zero",
        ));
    }

    if config.replies.max_length == 0 {
        errors.push(ValidationError::new("replies.max_length", "must be at least 1"));
    }

    if url::Url::parse(&config.blockchain.rpc_url).is_err() {
        errors.push(ValidationError::new("blockchain.rpc_url", "invalid URL"));
    }
    if config.blockchain.submit_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "blockchain.submit_timeout_secs",
            "must be at least 1",
        ));
    }

    let mut seen = HashSet::new();
    for (i, sender) in config.senders.iter().enumerate() {
        if sender.id.trim().is_empty() {
            errors.push(ValidationError::new(
                format!("senders[{}].id", i),
                "must not be empty",
            ));
        } else if !seen.insert(sender.id.as_str()) {
            errors.push(ValidationError::new(
                format!("senders[{}].id", i),
                format!("duplicate sender '{}'", sender.id),
            ));
        }
        if sender.private_key_env.is_empty() {
            errors.push(ValidationError::new(
                format!("senders[{}].private_key_env", i),
                "must not be empty",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
