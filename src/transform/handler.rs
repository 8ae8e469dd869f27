use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
};

use crate::http::request::request_id;
use crate::pipeline::{PipelineFailure, PipelineOutcome, Stage, TransformedImage};
use crate::transform::grayscale::{GrayscaleTransform, OUTPUT_FILE_NAME};

pub const TRANSFORM_PATH: &str = "/api/ImageGrayscaleFunction";

#[derive(Debug, Clone)]
pub struct TransformState {
    pub transform: GrayscaleTransform,
}

/// Convert the posted image to grayscale JPEG.
pub async fn grayscale_handler(
    State(state): State<TransformState>,
    headers: HeaderMap,
    body: Bytes,
) -> PipelineOutcome {
    let start = Instant::now();
    let request_id = request_id(&headers);
    let media_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unspecified");

    tracing::info!(
        request_id = %request_id,
        media_type = %media_type,
        bytes = body.len(),
        "Transforming image"
    );

    let transform = state.transform;
    let result = tokio::task::spawn_blocking(move || transform.apply(&body))
        .await
        .map_err(|e| PipelineFailure::invalid_input(Stage::Transform, e.to_string()))?;

    let jpeg = result.map_err(|e| PipelineFailure::invalid_input(Stage::Transform, e.to_string()))?;

    tracing::info!(
        request_id = %request_id,
        bytes = jpeg.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Image transformed"
    );
    Ok(TransformedImage::buffered(jpeg).with_attachment_name(OUTPUT_FILE_NAME))
}
