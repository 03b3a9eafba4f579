//! Inbound command sanitizing and parsing.
//!
//! # Data Flow
//! ```text
//! raw text from a channel
//!     → sanitize.rs (trim, strip characters outside the allow-list)
//!     → parser.rs (grammar, action allow-list, amount bounds, address check)
//!     → Command (immutable, consumed by security and blockchain)
//! ```
//!
//! # Design Decisions
//! - Parsing is a pure function of the input and static policy
//! - Amounts are exact decimals; the chain unit conversion lives in units.rs
//! - No parse failure ever reaches the rate limiter

pub mod parser;
pub mod sanitize;
pub mod types;
pub mod units;

pub use parser::CommandParser;
pub use sanitize::sanitize;
pub use types::{Action, Command, ParseError};
