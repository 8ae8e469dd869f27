//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All stages produce:
//!     → logging.rs (structured tracing events, per-request spans)
//!     → metrics.rs (request and hop counters/histograms)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every hop
//! - Metrics are cheap; without an installed recorder they are no-ops
//! - Failure causes appear in logs only, never in responses

pub mod logging;
pub mod metrics;
