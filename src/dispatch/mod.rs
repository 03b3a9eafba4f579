//! Request dispatch subsystem.
//!
//! # State Machine
//! ```text
//! RECEIVED → SANITIZED → AUTHORIZED → SUBMITTED → REPLIED
//!     └──────────┴────────────┴────────────┴──→ FAILED(reason) → reply
//! ```
//!
//! # Design Decisions
//! - One entry point for both channels; channel differences live in adapters
//!   and the reply router
//! - Quota is consumed only after SUBMITTED
//! - Every request yields exactly one reply; nothing here panics the worker
//! - Spawned dispatches are counted so shutdown can wait for them to finish

pub mod dispatcher;
pub mod inflight;
pub mod types;

pub use dispatcher::Dispatcher;
pub use inflight::InFlight;
pub use types::{reply_message, Outcome, PipelineError, Stage};
