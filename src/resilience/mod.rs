//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Broadcast to the chain:
//!     → timeouts.rs (deadline; elapsed counts as a submission failure)
//!
//! Bus connection lost:
//!     → backoff.rs (reconnect delay with jitter)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Transaction submission is never retried: it is not idempotent
//! - Only connection setup is retried

pub mod backoff;
pub mod timeouts;
