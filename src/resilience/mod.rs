//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound hop (ingestion → relay, relay → transform):
//!     → connector connect timeout
//!     → timeouts.rs (deadline over the whole exchange)
//!     → HopError::Timeout on expiry, surfaced as a 500 upstream
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline
//! - No retries: a failed hop is reported once, immediately
//! - Dropping the hop future cancels the downstream request

pub mod timeouts;

pub use timeouts::{with_deadline, HopTimeouts};
