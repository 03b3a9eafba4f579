//! Chain-specific types and error definitions.

use alloy::primitives::Address;
use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors raised by the chain client.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Invalid private key format or signing error.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Failures of the build-and-submit step, one per stage so replies can say
/// which stage failed without exposing node output.
#[derive(Debug, Error)]
pub enum TxError {
    /// Nonce, fee, chain id or gas could not be determined.
    #[error("estimation failed: {0}")]
    EstimationFailed(String),

    /// Network fee is above the configured cap.
    #[error("gas price {current_gwei} gwei exceeds maximum {max_gwei} gwei")]
    FeeTooHigh { current_gwei: u64, max_gwei: u64 },

    /// The transaction could not be signed.
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// Broadcast was rejected, failed, or timed out.
    #[error("submission failed: {0}")]
    SubmissionFailed(String),
}

/// Check an address string the way wallets do.
///
/// `0x` followed by 40 hex digits. All-lowercase or all-uppercase is accepted
/// as-is; mixed case must be a valid EIP-55 checksum.
pub fn is_valid_address(candidate: &str) -> bool {
    let Some(hex) = candidate.strip_prefix("0x") else {
        return false;
    };
    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return false;
    }

    let has_lower = hex.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = hex.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        Address::parse_checksummed(candidate, None).is_ok()
    } else {
        true
    }
}
