//! Payment gateway library: text commands in, value transfers out.

pub mod blockchain;
pub mod bus;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod security;

pub use config::schema::GatewayConfig;
pub use dispatch::Dispatcher;
pub use http::WebhookServer;
pub use lifecycle::Shutdown;
