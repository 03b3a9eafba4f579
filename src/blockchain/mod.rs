//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Command + Credential
//!     → transaction.rs (nonce, fee, chain id, gas → TransactionIntent)
//!     → wallet.rs (sign with the sender's key)
//!     → client.rs (broadcast once, return tx hash)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts
//! - Node error text never reaches a reply

pub mod client;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::{AlloyChainClient, ChainClient};
pub use transaction::{TransactionIntent, TxBuilder};
pub use types::{is_valid_address, BlockchainError, ChainId, TxError};
pub use wallet::Credential;
