//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve secrets named by the configuration from the environment
//! - Build every capability the dispatcher needs, in dependency order
//! - Fail fast on missing secrets or a node serving the wrong chain; an
//!   unreachable node is tolerated and reported by the health endpoint

use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::{AlloyChainClient, BlockchainError, ChainClient, TxBuilder};
use crate::bus::{BusPublisher, DisabledBus, RedisBusPublisher};
use crate::command::CommandParser;
use crate::config::{CounterBackend, GatewayConfig};
use crate::dispatch::Dispatcher;
use crate::http::{AppState, SignatureVerifier};
use crate::routing::{DeliveryError, ReplyRouter, Telephony, TwilioClient};
use crate::security::{
    Authorizer, CounterError, CounterStore, CredentialStore, MemoryCounterStore, RateLimiter,
    RedisCounterStore,
};

const MEMORY_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Errors that abort startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("sender credentials: {0}")]
    Credentials(BlockchainError),

    #[error("chain client: {0}")]
    Chain(BlockchainError),

    #[error("counter store: {0}")]
    Counter(#[from] CounterError),

    #[error("environment variable {0} is not set")]
    MissingSecret(String),

    #[error("telephony client: {0}")]
    Telephony(#[from] DeliveryError),

    #[error("message bus: {0}")]
    Bus(#[from] redis::RedisError),
}

/// Fully wired gateway, ready for its channel adapters.
pub struct Gateway {
    pub dispatcher: Arc<Dispatcher>,
    pub chain: Arc<dyn ChainClient>,
    pub verifier: Option<Arc<SignatureVerifier>>,
}

impl Gateway {
    /// State shared by the webhook handlers.
    pub fn app_state(&self) -> AppState {
        AppState {
            dispatcher: Arc::clone(&self.dispatcher),
            chain: Arc::clone(&self.chain),
            verifier: self.verifier.clone(),
        }
    }
}

/// Read a secret named by the configuration.
pub fn secret_from_env(var: &str) -> Result<String, StartupError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(StartupError::MissingSecret(var.to_string())),
    }
}

/// Build the gateway from validated configuration.
pub async fn build_gateway(config: &GatewayConfig) -> Result<Gateway, StartupError> {
    let credentials =
        Arc::new(CredentialStore::from_config(&config.senders).map_err(StartupError::Credentials)?);
    tracing::info!(senders = credentials.len(), "Sender credentials loaded");

    let alloy = AlloyChainClient::new(config.blockchain.clone())
        .await
        .map_err(StartupError::Chain)?;
    if let Err(e @ BlockchainError::ChainMismatch { .. }) = alloy.verify_chain_id().await {
        return Err(StartupError::Chain(e));
    }
    let chain: Arc<dyn ChainClient> = Arc::new(alloy);

    let store = counter_store(config).await?;
    let limiter = RateLimiter::from_config(store, &config.rate_limit);
    let authorizer = Authorizer::new(credentials, limiter);

    let auth_token = secret_from_env(&config.telephony.auth_token_env)?;
    let telephony: Arc<dyn Telephony> =
        Arc::new(TwilioClient::new(&config.telephony, auth_token.clone())?);

    let bus: Arc<dyn BusPublisher> = if config.bus.enabled {
        Arc::new(RedisBusPublisher::connect(&config.bus.redis_url).await?)
    } else {
        Arc::new(DisabledBus)
    };

    let verifier = match (&config.webhook.public_url, config.webhook.verify_signatures) {
        (Some(url), true) => Some(Arc::new(SignatureVerifier::new(auth_token, url.clone()))),
        _ => {
            tracing::warn!("Webhook signature verification disabled");
            None
        }
    };

    let builder = TxBuilder::new(
        Arc::clone(&chain),
        Duration::from_secs(config.blockchain.submit_timeout_secs),
        config.blockchain.max_gas_price_gwei,
    );
    let router = ReplyRouter::from_config(telephony, bus, &config.bus, &config.replies);
    let dispatcher = Dispatcher::new(
        CommandParser::from_config(&config.commands),
        authorizer,
        builder,
        router,
    );

    Ok(Gateway {
        dispatcher: Arc::new(dispatcher),
        chain,
        verifier,
    })
}

async fn counter_store(config: &GatewayConfig) -> Result<Arc<dyn CounterStore>, StartupError> {
    match config.rate_limit.backend {
        CounterBackend::Redis => {
            let store = RedisCounterStore::connect(&config.rate_limit.redis_url).await?;
            tracing::info!("Rate limit counters in Redis");
            Ok(Arc::new(store))
        }
        CounterBackend::Memory => {
            let store = MemoryCounterStore::new();
            let purge = store.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(MEMORY_PURGE_INTERVAL);
                loop {
                    ticker.tick().await;
                    purge.purge_expired();
                }
            });
            tracing::warn!("Rate limit counters in memory; not shared across instances");
            Ok(Arc::new(store))
        }
    }
}
