//! Reply routing subsystem.
//!
//! # Data Flow
//! ```text
//! ReplyEnvelope from the dispatcher
//!     → router.rs (pick channel)
//!         webhook → telephony.rs (truncate, send SMS to the sender)
//!         bus     → bus::publisher (publish on the response topic)
//! ```
//!
//! # Design Decisions
//! - Exactly one envelope per inbound request
//! - No automatic retries; a failed reply never re-enters the pipeline

pub mod envelope;
pub mod router;
pub mod telephony;

pub use envelope::{Channel, DeliveryError, ReplyEnvelope};
pub use router::ReplyRouter;
pub use telephony::{is_valid_phone, Telephony, TwilioClient};
