//! Relay stage: turns an image reference into a transformed image.
//!
//! # Data Flow
//! ```text
//! POST /api/communication/webapp (text/plain reference)
//!     → handler.rs (trim, validate)
//!     → forwarder.rs: blob store read (fails locally, transform untouched)
//!     → forwarder.rs: POST bytes to transform stage (pooled client, deadline)
//!     → 2xx: stream body back as image/jpeg
//!     → otherwise: 500
//! ```

pub mod forwarder;
pub mod handler;

pub use forwarder::{Forwarder, TransformClient};
pub use handler::{forward_handler, RelayState, RELAY_PATH};
