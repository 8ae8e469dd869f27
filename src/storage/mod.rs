//! Blob store subsystem.
//!
//! # Data Flow
//! ```text
//! Ingestion:
//!     ImageBlob → blob.rs put (create-new file under root) → ImageReference
//! Relay:
//!     ImageReference → blob.rs get (must resolve inside root) → bytes
//! Ingestion (after relay answers):
//!     BlobLease release (or drop, on cancellation) → blob.rs remove
//! ```
//!
//! # Design Decisions
//! - Keys are generated (UUID v4); the client file name is only a suffix
//! - Files are never overwritten
//! - References resolving outside the root are refused

pub mod blob;

pub use blob::{BlobError, BlobLease, BlobStore};
