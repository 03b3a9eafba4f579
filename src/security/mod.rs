//! Authorization and rate limiting subsystem.
//!
//! # Data Flow
//! ```text
//! Parsed command + sender:
//!     → credentials.rs (sender registered? → signing credential)
//!     → rate_limit.rs (read the sender's window; no write)
//!     → Credential handed to the transaction builder
//!
//! After a successful submission:
//!     → rate_limit.rs (atomic increment + TTL refresh in counter.rs)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a counter store read failure refuses the request
//! - Malformed input never reaches this subsystem, so it never costs quota
//! - The counter store is the only shared mutable state in the pipeline

pub mod authorizer;
pub mod counter;
pub mod credentials;
pub mod rate_limit;

pub use authorizer::{AuthError, Authorizer};
pub use counter::{CounterError, CounterStore, MemoryCounterStore, RedisCounterStore};
pub use credentials::CredentialStore;
pub use rate_limit::RateLimiter;
