//! Sender signing credentials.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized

use alloy::eips::eip2718::Encodable2718;
use alloy::network::{Ethereum, EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// A sender's signing key.
#[derive(Clone)]
pub struct Credential {
    signer: PrivateKeySigner,
}

impl Credential {
    /// Create a credential from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    ///
    /// # Security
    /// The private key is never logged; only the derived address is.
    pub fn from_private_key(private_key_hex: &str) -> BlockchainResult<Self> {
        let key_hex = private_key_hex
            .trim()
            .strip_prefix("0x")
            .unwrap_or(private_key_hex.trim());

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| BlockchainError::Wallet(format!("Invalid private key format: {}", e)))?;

        Ok(Self { signer })
    }

    /// Load a credential from the named environment variable.
    pub fn from_env(var: &str) -> BlockchainResult<Self> {
        let private_key = std::env::var(var).map_err(|_| {
            BlockchainError::Wallet(format!("Environment variable {} not set", var))
        })?;

        Self::from_private_key(&private_key)
    }

    /// The sending address derived from the key.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Sign a fully populated transaction request and return the
    /// EIP-2718 encoded payload ready for broadcast.
    pub async fn sign_transaction(&self, tx: TransactionRequest) -> BlockchainResult<Bytes> {
        let wallet = EthereumWallet::from(self.signer.clone());
        let envelope = <TransactionRequest as TransactionBuilder<Ethereum>>::build(tx, &wallet)
            .await
            .map_err(|e| BlockchainError::Wallet(format!("Signing failed: {}", e)))?;

        Ok(envelope.encoded_2718().into())
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    // Well-known test private key (Anvil's first account)
    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_credential_from_private_key() {
        let credential = Credential::from_private_key(TEST_PRIVATE_KEY).unwrap();
        assert_eq!(
            credential.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_credential_with_0x_prefix() {
        let credential =
            Credential::from_private_key(&format!("0x{}", TEST_PRIVATE_KEY)).unwrap();
        assert_eq!(
            credential.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_invalid_private_key() {
        let result = Credential::from_private_key("invalid_key");
        assert!(result.unwrap_err().to_string().contains("Invalid private key"));
    }

    #[test]
    fn test_missing_env_var() {
        let result = Credential::from_env("PAYMENT_GATEWAY_TEST_UNSET_KEY");
        assert!(result.unwrap_err().to_string().contains("not set"));
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let credential = Credential::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let rendered = format!("{:?}", credential);
        assert!(!rendered.contains(TEST_PRIVATE_KEY));
    }

    #[tokio::test]
    async fn test_sign_legacy_transfer() {
        let credential = Credential::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let tx = TransactionRequest::default()
            .with_from(credential.address())
            .with_to(Address::ZERO)
            .with_value(U256::from(1u64))
            .with_nonce(0)
            .with_gas_limit(21_000)
            .with_gas_price(1_000_000_000)
            .with_chain_id(31337);

        let signed = credential.sign_transaction(tx).await.unwrap();
        // Legacy transactions are RLP lists, not typed envelopes.
        assert!(signed[0] >= 0xc0);
    }

    #[tokio::test]
    async fn test_sign_incomplete_transaction_fails() {
        let credential = Credential::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let tx = TransactionRequest::default().with_to(Address::ZERO);
        assert!(credential.sign_transaction(tx).await.is_err());
    }
}
