//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, one span per inbound request)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Every pipeline failure is logged and counted, even if its reply is lost
//! - Request ID flows through the dispatch span
//! - Secrets are never recorded

pub mod logging;
pub mod metrics;
