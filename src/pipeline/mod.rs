//! Pipeline domain model.
//!
//! # Data Flow
//! ```text
//! client upload
//!     → ImageBlob (bytes + media type + file name)
//!     → blob store write → ImageReference
//!     → relay resolves reference → ImageBlob
//!     → transform → TransformedImage
//!     → streamed back hop by hop
//!
//! Any stage may short-circuit with a PipelineFailure,
//! converted to one HTTP status at that stage's boundary.
//! ```
//!
//! # Design Decisions
//! - Nothing outlives a single traversal
//! - Failures carry the stage that produced them
//! - Causes are logged at the boundary, never sent to the caller

pub mod error;
pub mod types;

pub use error::{FailureKind, HopError, PipelineFailure, PipelineOutcome};
pub use types::{ImageBlob, ImageReference, Stage, TransformedImage, IMAGE_JPEG};
