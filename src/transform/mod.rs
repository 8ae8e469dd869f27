//! Transform stage: raw image bytes in, grayscale JPEG out.
//!
//! # Data Flow
//! ```text
//! POST /api/ImageGrayscaleFunction (raw bytes)
//!     → handler.rs (body limit, media type hint logged)
//!     → blocking pool: grayscale.rs decode → luma → JPEG
//!     → 200 image/jpeg + Content-Disposition
//!     or 400 with empty body
//! ```

pub mod grayscale;
pub mod handler;

pub use grayscale::{GrayscaleTransform, TransformError, OUTPUT_FILE_NAME};
pub use handler::{grayscale_handler, TransformState, TRANSFORM_PATH};
