//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → consumed once by lifecycle::startup
//! ```
//!
//! # Design Decisions
//! - Config is loaded once at startup; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Secrets are referenced by environment variable name, never inlined
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    BlockchainConfig, BusConfig, CommandConfig, CounterBackend, GatewayConfig, LogFormat,
    ObservabilityConfig, RateLimitConfig, ReplyConfig, SenderConfig, TelephonyConfig,
    WebhookConfig,
};
