//! Ingestion stage: the only surface exposed to external clients.
//!
//! # Data Flow
//! ```text
//! POST /api/image/upload (multipart, field "image")
//!     → handler.rs (missing/empty file → 400)
//!     → uploader.rs: blob store write → ImageReference
//!     → relay_client.rs: POST reference as text/plain to relay
//!     → uploader.rs: remove blob (unless retained)
//!     → 200 image/jpeg, or 500 on any storage/relay failure
//! ```

pub mod handler;
pub mod relay_client;
pub mod uploader;

pub use handler::{upload_handler, IngestionState, IMAGE_FIELD, UPLOAD_PATH};
pub use relay_client::RelayClient;
pub use uploader::Uploader;
