//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Expose the chain operations the gateway needs as a capability trait
//! - Query chain state (nonce, gas price, chain id, gas estimate)
//! - Broadcast signed transactions
//! - Handle timeouts and failover between read providers
//! - Provide health check for blockchain connectivity

use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{self, BlockchainError, BlockchainResult, ChainId};
use crate::blockchain::wallet::Credential;
use crate::config::BlockchainConfig;
use crate::observability::metrics;

/// Chain operations the transaction pipeline depends on.
///
/// Injected into the builder so tests can substitute a fake node.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Next transaction sequence number for `address`.
    async fn get_nonce(&self, address: Address) -> BlockchainResult<u64>;

    /// Current gas price in wei.
    async fn get_fee_rate(&self) -> BlockchainResult<u128>;

    /// Chain identifier reported by the node.
    async fn get_chain_id(&self) -> BlockchainResult<u64>;

    /// Gas needed to execute `tx`.
    async fn estimate_gas(&self, tx: &TransactionRequest) -> BlockchainResult<u64>;

    /// Sign `tx` with `credential`, returning the raw payload.
    async fn sign(&self, tx: TransactionRequest, credential: &Credential) -> BlockchainResult<Bytes>;

    /// Broadcast a signed payload. Not idempotent from the caller's view.
    async fn submit(&self, signed_tx: Bytes) -> BlockchainResult<TxHash>;

    /// Whether `candidate` is an acceptable destination address.
    fn is_valid_address(&self, candidate: &str) -> bool;

    /// Whether the node is reachable.
    async fn is_healthy(&self) -> bool;
}

/// Blockchain RPC client wrapper with failover support.
#[derive(Clone)]
pub struct AlloyChainClient {
    /// List of providers (primary + failovers).
    providers: Vec<Arc<dyn Provider + Send + Sync>>,
    /// Configuration.
    config: BlockchainConfig,
    /// Read request timeout duration.
    timeout_duration: Duration,
}

impl AlloyChainClient {
    /// Create a new blockchain client.
    ///
    /// # Arguments
    /// * `config` - Blockchain configuration
    ///
    /// # Returns
    /// A new client or error if the primary URL is invalid
    pub async fn new(config: BlockchainConfig) -> BlockchainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut providers = Vec::new();

        // 1. Add primary provider
        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            BlockchainError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        providers.push(Arc::new(ProviderBuilder::new().connect_http(primary_url))
            as Arc<dyn Provider + Send + Sync>);

        // 2. Add failover providers
        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(Arc::new(ProviderBuilder::new().connect_http(url))
                    as Arc<dyn Provider + Send + Sync>);
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        let client = Self {
            providers,
            config: config.clone(),
            timeout_duration,
        };

        // Verify chain ID matches configuration
        match client.verify_chain_id().await {
            Ok(()) => {
                tracing::info!(
                    rpc_url = %config.rpc_url,
                    chain_id = config.chain_id,
                    "Blockchain client initialized"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Blockchain client initialized but chain verification failed"
                );
                // Don't fail initialization - allow graceful degradation
            }
        }

        Ok(client)
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> BlockchainResult<()> {
        let chain_id = ChainId(self.get_chain_id().await?);
        if chain_id.0 != self.config.chain_id {
            return Err(BlockchainError::ChainMismatch {
                expected: self.config.chain_id,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> BlockchainResult<u64> {
        self.read("block number", |p| async move { p.get_block_number().await })
            .await
    }

    /// Run a read call against each provider in turn until one answers.
    async fn read<T, F, Fut, E>(&self, what: &str, call: F) -> BlockchainResult<T>
    where
        F: Fn(Arc<dyn Provider + Send + Sync>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, call(provider.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, "RPC timeout, trying next provider");
                }
            }
        }
        Err(BlockchainError::Rpc(format!("All RPC providers failed to get {}", what)))
    }
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    async fn get_nonce(&self, address: Address) -> BlockchainResult<u64> {
        self.read("transaction count", |p| async move {
            p.get_transaction_count(address).await
        })
        .await
    }

    async fn get_fee_rate(&self) -> BlockchainResult<u128> {
        self.read("gas price", |p| async move { p.get_gas_price().await })
            .await
    }

    async fn get_chain_id(&self) -> BlockchainResult<u64> {
        self.read("chain id", |p| async move { p.get_chain_id().await })
            .await
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> BlockchainResult<u64> {
        self.read("gas estimate", |p| {
            let tx = tx.clone();
            async move { p.estimate_gas(tx).await }
        })
        .await
    }

    async fn sign(&self, tx: TransactionRequest, credential: &Credential) -> BlockchainResult<Bytes> {
        credential.sign_transaction(tx).await
    }

    async fn submit(&self, signed_tx: Bytes) -> BlockchainResult<TxHash> {
        // Primary only: a broadcast is never replayed against another node.
        let pending = self.providers[0]
            .send_raw_transaction(&signed_tx)
            .await
            .map_err(|e| BlockchainError::Rpc(e.to_string()))?;
        Ok(*pending.tx_hash())
    }

    fn is_valid_address(&self, candidate: &str) -> bool {
        types::is_valid_address(candidate)
    }

    /// Returns true if we can query the block number.
    async fn is_healthy(&self) -> bool {
        let healthy = self.get_block_number().await.is_ok();
        metrics::record_chain_health(healthy);
        healthy
    }
}

impl std::fmt::Debug for AlloyChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlloyChainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
