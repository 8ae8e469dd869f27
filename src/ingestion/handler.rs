use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::http::request::request_id;
use crate::ingestion::uploader::Uploader;
use crate::pipeline::{ImageBlob, PipelineFailure, Stage, IMAGE_JPEG};

pub const UPLOAD_PATH: &str = "/api/image/upload";

/// Multipart field expected to carry the image.
pub const IMAGE_FIELD: &str = "image";

#[derive(Clone)]
pub struct IngestionState {
    pub uploader: Uploader,
}

/// Accept an image upload and answer with its grayscale version.
pub async fn upload_handler(
    State(state): State<IngestionState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let request_id = request_id(&headers);

    let multipart = match multipart {
        Ok(m) => m,
        Err(rejection) => {
            return PipelineFailure::invalid_input(Stage::Ingestion, rejection.body_text())
                .into_response();
        }
    };

    let blob = match read_image_field(multipart).await {
        Ok(Some(blob)) if !blob.is_empty() => blob,
        Ok(_) => {
            return PipelineFailure::invalid_input(Stage::Ingestion, "missing or empty image file")
                .into_response();
        }
        Err(response) => return response,
    };

    match state.uploader.upload_image(blob, &request_id).await {
        Ok(image) => image.into_response(),
        Err(failure) => failure.into_response(),
    }
}

/// Pull the image out of the form: the `image` field, or failing that the
/// first field that carries a file name.
async fn read_image_field(mut multipart: Multipart) -> Result<Option<ImageBlob>, Response> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Ok(None),
            Err(e) => return Err(multipart_failure(e.status(), e.body_text())),
        };

        if field.name() != Some(IMAGE_FIELD) && field.file_name().is_none() {
            continue;
        }

        let file_name = field.file_name().map(str::to_owned);
        let media_type = field.content_type().unwrap_or(IMAGE_JPEG).to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_failure(e.status(), e.body_text()))?;

        let blob = ImageBlob::new(bytes, media_type);
        return Ok(Some(match file_name {
            Some(name) => blob.with_file_name(name),
            None => blob,
        }));
    }
}

fn multipart_failure(status: StatusCode, reason: String) -> Response {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!(reason = %reason, "Upload exceeds size limit");
        return (status, "Upload too large.").into_response();
    }
    PipelineFailure::invalid_input(Stage::Ingestion, reason).into_response()
}
