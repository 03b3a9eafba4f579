//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Credentials → Chain → Counter store → Telephony/Bus → Dispatcher
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     Broadcast → webhook server drains, bus listener unsubscribes
//!         → in-flight dispatches drained (bounded) → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: listeners start only after every capability is built
//! - Shutdown waits for in-flight dispatches, up to a deadline longer than
//!   the submit timeout, before the runtime exits

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{drain_deadline, Shutdown};
pub use signals::shutdown_on_signal;
pub use startup::{build_gateway, Gateway, StartupError};
