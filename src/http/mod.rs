//! Webhook channel.
//!
//! # Data Flow
//! ```text
//! Provider POST (form: From, Body)
//!     → server.rs (body limit, timeout, trace)
//!     → signature.rs (HMAC-SHA1 check, 403 on mismatch)
//!     → Dispatcher (detached task)
//!     → 204 No Content
//! ```

pub mod server;
pub mod signature;

pub use server::{AppState, WebhookServer};
pub use signature::{SignatureVerifier, SIGNATURE_HEADER};
