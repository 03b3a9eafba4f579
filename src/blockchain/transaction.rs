//! Transaction building, signing, and submission.
//!
//! # Responsibilities
//! - Read nonce, gas price and chain id fresh for every request
//! - Estimate gas for a plain value transfer
//! - Sign with the sender's credential and broadcast exactly once
//! - Map chain client failures onto the stage that failed

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::client::ChainClient;
use crate::blockchain::types::TxError;
use crate::blockchain::wallet::Credential;
use crate::command::{units, Command};
use crate::resilience::timeouts::with_deadline;

const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Everything needed to build one transfer. Lives for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionIntent {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub gas: u64,
    pub fee_rate: u128,
    pub nonce: u64,
    pub chain_id: u64,
}

impl TransactionIntent {
    /// The legacy transaction request this intent describes.
    pub fn to_request(&self) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(self.from)
            .with_to(self.to)
            .with_value(self.value)
            .with_nonce(self.nonce)
            .with_gas_limit(self.gas)
            .with_gas_price(self.fee_rate)
            .with_chain_id(self.chain_id)
    }
}

/// Transaction builder for value transfers.
#[derive(Clone)]
pub struct TxBuilder {
    chain: Arc<dyn ChainClient>,
    submit_timeout: Duration,
    max_gas_price_gwei: Option<u64>,
}

impl TxBuilder {
    /// Create a new transaction builder.
    pub fn new(
        chain: Arc<dyn ChainClient>,
        submit_timeout: Duration,
        max_gas_price_gwei: Option<u64>,
    ) -> Self {
        Self {
            chain,
            submit_timeout,
            max_gas_price_gwei,
        }
    }

    /// Assemble the transaction intent for `command` sent by `credential`.
    pub async fn prepare(
        &self,
        credential: &Credential,
        command: &Command,
    ) -> Result<TransactionIntent, TxError> {
        let from = credential.address();
        let to: Address = command
            .recipient
            .parse()
            .map_err(|e| TxError::EstimationFailed(format!("recipient: {}", e)))?;
        let value = units::to_smallest_unit(command.amount)
            .map_err(|e| TxError::EstimationFailed(format!("amount: {}", e)))?;

        let nonce = self
            .chain
            .get_nonce(from)
            .await
            .map_err(|e| TxError::EstimationFailed(e.to_string()))?;

        let fee_rate = self
            .chain
            .get_fee_rate()
            .await
            .map_err(|e| TxError::EstimationFailed(e.to_string()))?;

        // Cap is compared in wei; fractional gwei above the cap still counts.
        if let Some(max_gwei) = self.max_gas_price_gwei {
            if fee_rate > u128::from(max_gwei) * WEI_PER_GWEI {
                let current_gwei = fee_rate.div_ceil(WEI_PER_GWEI);
                return Err(TxError::FeeTooHigh {
                    current_gwei: u64::try_from(current_gwei).unwrap_or(u64::MAX),
                    max_gwei,
                });
            }
        }

        let chain_id = self
            .chain
            .get_chain_id()
            .await
            .map_err(|e| TxError::EstimationFailed(e.to_string()))?;

        let probe = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_value(value);
        let gas = self
            .chain
            .estimate_gas(&probe)
            .await
            .map_err(|e| TxError::EstimationFailed(e.to_string()))?;

        Ok(TransactionIntent {
            from,
            to,
            value,
            gas,
            fee_rate,
            nonce,
            chain_id,
        })
    }

    /// Build, sign and broadcast the transfer for `command`.
    ///
    /// Each call broadcasts a new transaction; callers must not retry it.
    pub async fn build_and_submit(
        &self,
        credential: &Credential,
        command: &Command,
    ) -> Result<TxHash, TxError> {
        let intent = self.prepare(credential, command).await?;

        let signed = self
            .chain
            .sign(intent.to_request(), credential)
            .await
            .map_err(|e| TxError::SigningFailed(e.to_string()))?;

        tracing::debug!(
            from = %intent.from,
            to = %intent.to,
            nonce = intent.nonce,
            gas = intent.gas,
            chain_id = intent.chain_id,
            "Submitting transaction"
        );

        match with_deadline(self.submit_timeout, self.chain.submit(signed)).await {
            Ok(Ok(hash)) => Ok(hash),
            Ok(Err(e)) => Err(TxError::SubmissionFailed(e.to_string())),
            Err(elapsed) => Err(TxError::SubmissionFailed(elapsed.to_string())),
        }
    }

    /// The chain client this builder submits through.
    pub fn chain(&self) -> &Arc<dyn ChainClient> {
        &self.chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::{BlockchainError, BlockchainResult};
    use crate::command::Action;
    use alloy::primitives::{Bytes, B256};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicU32, Ordering};

    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const RECIPIENT: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

    #[derive(Default)]
    struct StubChain {
        fail_estimate: bool,
        hang_submit: bool,
        fee_rate: u128,
        submits: AtomicU32,
    }

    #[async_trait]
    impl ChainClient for StubChain {
        async fn get_nonce(&self, _address: Address) -> BlockchainResult<u64> {
            Ok(7)
        }
        async fn get_fee_rate(&self) -> BlockchainResult<u128> {
            Ok(self.fee_rate)
        }
        async fn get_chain_id(&self) -> BlockchainResult<u64> {
            Ok(31337)
        }
        async fn estimate_gas(&self, _tx: &TransactionRequest) -> BlockchainResult<u64> {
            if self.fail_estimate {
                Err(BlockchainError::Rpc("execution reverted".to_string()))
            } else {
                Ok(21_000)
            }
        }
        async fn sign(
            &self,
            tx: TransactionRequest,
            credential: &Credential,
        ) -> BlockchainResult<Bytes> {
            credential.sign_transaction(tx).await
        }
        async fn submit(&self, _signed_tx: Bytes) -> BlockchainResult<TxHash> {
            self.submits.fetch_add(1, Ordering::SeqCst);
            if self.hang_submit {
                std::future::pending::<()>().await;
            }
            Ok(B256::repeat_byte(0xab))
        }
        fn is_valid_address(&self, _candidate: &str) -> bool {
            true
        }
        async fn is_healthy(&self) -> bool {
            true
        }
    }

    fn command(amount: Decimal) -> Command {
        Command {
            action: Action::Pay,
            amount,
            recipient: RECIPIENT.to_string(),
        }
    }

    fn builder(chain: Arc<StubChain>, max_gwei: Option<u64>) -> TxBuilder {
        TxBuilder::new(chain, Duration::from_millis(200), max_gwei)
    }

    #[tokio::test]
    async fn test_prepare_reads_chain_state() {
        let chain = Arc::new(StubChain {
            fee_rate: 2_000_000_000,
            ..Default::default()
        });
        let credential = Credential::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let intent = builder(chain, None)
            .prepare(&credential, &command(Decimal::new(1, 1)))
            .await
            .unwrap();

        assert_eq!(intent.from, credential.address());
        assert_eq!(intent.to, RECIPIENT.parse::<Address>().unwrap());
        assert_eq!(intent.value, U256::from(100_000_000_000_000_000u64));
        assert_eq!(intent.nonce, 7);
        assert_eq!(intent.gas, 21_000);
        assert_eq!(intent.chain_id, 31337);
    }

    #[tokio::test]
    async fn test_build_and_submit_once() {
        let chain = Arc::new(StubChain {
            fee_rate: 1_000_000_000,
            ..Default::default()
        });
        let credential = Credential::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let hash = builder(chain.clone(), None)
            .build_and_submit(&credential, &command(Decimal::ONE))
            .await
            .unwrap();

        assert_eq!(hash, B256::repeat_byte(0xab));
        assert_eq!(chain.submits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_estimation_failure_skips_submission() {
        let chain = Arc::new(StubChain {
            fail_estimate: true,
            fee_rate: 1,
            ..Default::default()
        });
        let credential = Credential::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let result = builder(chain.clone(), None)
            .build_and_submit(&credential, &command(Decimal::ONE))
            .await;

        assert!(matches!(result, Err(TxError::EstimationFailed(_))));
        assert_eq!(chain.submits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fee_cap() {
        let chain = Arc::new(StubChain {
            fee_rate: 600_000_000_000,
            ..Default::default()
        });
        let credential = Credential::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let result = builder(chain.clone(), Some(500))
            .build_and_submit(&credential, &command(Decimal::ONE))
            .await;

        assert!(matches!(
            result,
            Err(TxError::FeeTooHigh {
                current_gwei: 600,
                max_gwei: 500
            })
        ));
        assert_eq!(chain.submits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fee_cap_counts_fractional_gwei() {
        let credential = Credential::from_private_key(TEST_PRIVATE_KEY).unwrap();

        // 500.9 gwei against a 500 gwei cap
        let over = Arc::new(StubChain {
            fee_rate: 500_900_000_000,
            ..Default::default()
        });
        let result = builder(over.clone(), Some(500))
            .build_and_submit(&credential, &command(Decimal::ONE))
            .await;
        assert!(matches!(
            result,
            Err(TxError::FeeTooHigh {
                current_gwei: 501,
                max_gwei: 500
            })
        ));
        assert_eq!(over.submits.load(Ordering::SeqCst), 0);

        // exactly at the cap is allowed
        let at_cap = Arc::new(StubChain {
            fee_rate: 500_000_000_000,
            ..Default::default()
        });
        assert!(builder(at_cap, Some(500))
            .build_and_submit(&credential, &command(Decimal::ONE))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_submit_timeout_is_submission_failure() {
        let chain = Arc::new(StubChain {
            hang_submit: true,
            fee_rate: 1,
            ..Default::default()
        });
        let credential = Credential::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let result = builder(chain.clone(), None)
            .build_and_submit(&credential, &command(Decimal::ONE))
            .await;

        assert!(matches!(result, Err(TxError::SubmissionFailed(_))));
        assert_eq!(chain.submits.load(Ordering::SeqCst), 1);
    }
}
