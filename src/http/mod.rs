//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware stack per stage)
//!     → request.rs (request ID assigned or kept, trace span)
//!     → stage handler (ingestion / relay / transform)
//!     → status.rs for GET /health
//! ```

pub mod request;
pub mod server;
pub mod status;

pub use request::X_REQUEST_ID;
pub use server::{HttpServer, ServerError};
