//! Grayscale relay pipeline.
//!
//! Three HTTP stages pass an uploaded image along a chain and return its
//! grayscale version:
//!
//! ```text
//!  client ──▶ ingestion ──▶ relay ──▶ transform
//!         ◀──           ◀──      ◀──
//!              │  ▲        │
//!              ▼  │        ▼
//!            ┌──────────────┐
//!            │  blob store  │
//!            └──────────────┘
//! ```
//!
//! Ingestion stores the upload and hands the relay a reference. The relay
//! resolves it, posts the bytes to the transform stage and streams the JPEG
//! back. Any failure becomes a single status at the stage where it happened.

// Stages
pub mod ingestion;
pub mod relay;
pub mod transform;

// Core
pub mod config;
pub mod http;
pub mod pipeline;
pub mod storage;

// Cross-cutting concerns
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;

pub use config::PipelineConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::Stage;
