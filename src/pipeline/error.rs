//! Failure taxonomy and its mapping to HTTP statuses.
//!
//! # Status Mapping
//! ```text
//! Transform: any failure            → 400, empty body
//! Ingestion: InvalidInput           → 400 "Invalid image file."
//!            other                  → 500 "Internal Server Error"
//! Relay:     any failure            → 500 "Internal Server Error"
//! ```

use std::fmt;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::pipeline::types::{Stage, TransformedImage};
use crate::storage::BlobError;

/// Result of one stage's share of a traversal.
pub type PipelineOutcome = Result<TransformedImage, PipelineFailure>;

/// Coarse failure class, as seen by the immediate caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Missing/empty upload or undecodable bytes.
    InvalidInput,
    /// Next hop refused, timed out or answered non-2xx.
    DownstreamUnavailable,
    /// Blob store read or write failed.
    StorageFailure,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::InvalidInput => "invalid_input",
            FailureKind::DownstreamUnavailable => "downstream_unavailable",
            FailureKind::StorageFailure => "storage_failure",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a stage-to-stage call.
#[derive(Debug, thiserror::Error)]
pub enum HopError {
    #[error("{target} unreachable: {reason}")]
    Unreachable { target: Stage, reason: String },

    #[error("{target} did not answer within {timeout:?}")]
    Timeout { target: Stage, timeout: Duration },

    #[error("{target} answered {status}")]
    Status { target: Stage, status: StatusCode },

    #[error("invalid request for {target}: {reason}")]
    Request { target: Stage, reason: String },
}

/// A failure recorded by `stage`, converted to a status at its boundary.
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed ({kind}): {reason}")]
pub struct PipelineFailure {
    pub stage: Stage,
    pub kind: FailureKind,
    pub reason: String,
}

impl PipelineFailure {
    pub fn new(stage: Stage, kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            reason: reason.into(),
        }
    }

    pub fn invalid_input(stage: Stage, reason: impl Into<String>) -> Self {
        Self::new(stage, FailureKind::InvalidInput, reason)
    }

    pub fn downstream(stage: Stage, err: &HopError) -> Self {
        Self::new(stage, FailureKind::DownstreamUnavailable, err.to_string())
    }

    pub fn storage(stage: Stage, err: &BlobError) -> Self {
        Self::new(stage, FailureKind::StorageFailure, err.to_string())
    }

    /// Status and public body for the immediate caller.
    pub fn public_response(&self) -> (StatusCode, &'static str) {
        match (self.stage, self.kind) {
            (Stage::Transform, _) => (StatusCode::BAD_REQUEST, ""),
            (Stage::Ingestion, FailureKind::InvalidInput) => {
                (StatusCode::BAD_REQUEST, "Invalid image file.")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
        }
    }
}

impl IntoResponse for PipelineFailure {
    fn into_response(self) -> Response {
        let (status, body) = self.public_response();
        if status.is_server_error() {
            tracing::error!(
                stage = %self.stage,
                kind = %self.kind,
                reason = %self.reason,
                "Pipeline request failed"
            );
        } else {
            tracing::warn!(
                stage = %self.stage,
                kind = %self.kind,
                reason = %self.reason,
                "Pipeline request rejected"
            );
        }
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_failures_are_bad_requests() {
        for kind in [
            FailureKind::InvalidInput,
            FailureKind::DownstreamUnavailable,
            FailureKind::StorageFailure,
        ] {
            let failure = PipelineFailure::new(Stage::Transform, kind, "boom");
            assert_eq!(failure.public_response(), (StatusCode::BAD_REQUEST, ""));
        }
    }

    #[test]
    fn test_relay_failures_are_opaque() {
        let failure = PipelineFailure::invalid_input(Stage::Relay, "empty reference");
        assert_eq!(failure.public_response().0, StatusCode::INTERNAL_SERVER_ERROR);

        let hop = HopError::Status {
            target: Stage::Transform,
            status: StatusCode::BAD_REQUEST,
        };
        let failure = PipelineFailure::downstream(Stage::Relay, &hop);
        assert_eq!(failure.public_response().0, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(failure.reason.contains("400"));
    }

    #[test]
    fn test_ingestion_mapping() {
        let rejected = PipelineFailure::invalid_input(Stage::Ingestion, "no file");
        assert_eq!(
            rejected.public_response(),
            (StatusCode::BAD_REQUEST, "Invalid image file.")
        );

        let hop = HopError::Unreachable {
            target: Stage::Relay,
            reason: "connection refused".into(),
        };
        let failed = PipelineFailure::downstream(Stage::Ingestion, &hop);
        let (status, body) = failed.public_response();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("refused"));

        let blob = BlobError::Io {
            path: "/srv/Images/abc-photo.jpg".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        let failed = PipelineFailure::storage(Stage::Ingestion, &blob);
        assert_eq!(failed.kind, FailureKind::StorageFailure);
        assert_eq!(
            failed.public_response(),
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        );
        assert!(failed.reason.contains("abc-photo.jpg"));
    }
}
