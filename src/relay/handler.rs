use axum::{body::Bytes, extract::State, http::HeaderMap};

use crate::http::request::request_id;
use crate::pipeline::{ImageReference, PipelineFailure, PipelineOutcome, Stage};
use crate::relay::forwarder::Forwarder;

pub const RELAY_PATH: &str = "/api/communication/webapp";

#[derive(Clone)]
pub struct RelayState {
    pub forwarder: Forwarder,
}

/// Receive an image reference from the ingestion stage and return the
/// transformed image.
pub async fn forward_handler(
    State(state): State<RelayState>,
    headers: HeaderMap,
    body: Bytes,
) -> PipelineOutcome {
    let request_id = request_id(&headers);

    let reference = std::str::from_utf8(&body)
        .map(str::trim)
        .map_err(|e| PipelineFailure::invalid_input(Stage::Relay, e.to_string()))?;
    if reference.is_empty() {
        return Err(PipelineFailure::invalid_input(
            Stage::Relay,
            "empty image reference",
        ));
    }
    let reference = ImageReference::new(reference);

    tracing::info!(
        request_id = %request_id,
        reference = %reference,
        "Received image reference"
    );

    state
        .forwarder
        .forward_for_transform(&reference, &request_id)
        .await
}
