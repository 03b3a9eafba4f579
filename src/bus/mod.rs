//! Message bus channel.
//!
//! # Data Flow
//! ```text
//! broker topic (request_topic)
//!     → subscriber.rs (one spawned dispatch per message, sender = topic)
//!     → Dispatcher
//!     → publisher.rs (reply on request_topic + response_suffix)
//! ```
//!
//! # Design Decisions
//! - Transport is Redis pub/sub; delivery is at-most-once, like the broker
//! - Messages on the response topic are ignored even when a pattern matches it
//! - Broker disconnects are retried with backoff; dispatches already running
//!   finish regardless

pub mod publisher;
pub mod subscriber;

pub use publisher::{BusPublisher, DisabledBus, RedisBusPublisher};
pub use subscriber::{BusListener, BusRequest};
