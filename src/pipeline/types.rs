//! Core pipeline types.

use std::fmt;
use std::path::{Path, PathBuf};

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

/// Media type of every image the pipeline returns.
pub const IMAGE_JPEG: &str = "image/jpeg";

/// One of the three pipeline services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Ingestion,
    Relay,
    Transform,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Ingestion, Stage::Relay, Stage::Transform];

    /// Stable lowercase name used in logs, metrics and the CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Ingestion => "ingestion",
            Stage::Relay => "relay",
            Stage::Transform => "transform",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoded image bytes as uploaded or read back from the blob store.
#[derive(Debug, Clone)]
pub struct ImageBlob {
    pub bytes: Bytes,
    /// Declared media type, e.g. `image/png`.
    pub media_type: String,
    /// Client-supplied file name. Diagnostics only, never used as a key.
    pub file_name: Option<String>,
}

impl ImageBlob {
    pub fn new(bytes: impl Into<Bytes>, media_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: media_type.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Build a blob from stored bytes, declaring the media type detected from
    /// the content. Unknown content is declared as JPEG.
    pub fn sniffed(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let media_type = image::guess_format(&bytes)
            .map(|format| format.to_mime_type())
            .unwrap_or(IMAGE_JPEG);
        Self::new(bytes, media_type)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Opaque handle to a stored [`ImageBlob`]. Currently the storage path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference(String);

impl ImageReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl From<PathBuf> for ImageReference {
    fn from(path: PathBuf) -> Self {
        Self(path.to_string_lossy().into_owned())
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// JPEG output of the transform stage, either fully buffered or still
/// streaming from the previous hop.
pub struct TransformedImage {
    body: Body,
    attachment_name: Option<&'static str>,
}

impl TransformedImage {
    pub fn buffered(bytes: impl Into<Bytes>) -> Self {
        Self {
            body: Body::from(bytes.into()),
            attachment_name: None,
        }
    }

    pub fn streaming(body: Body) -> Self {
        Self {
            body,
            attachment_name: None,
        }
    }

    /// Suggest a download file name via `Content-Disposition`.
    pub fn with_attachment_name(mut self, name: &'static str) -> Self {
        self.attachment_name = Some(name);
        self
    }
}

impl fmt::Debug for TransformedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformedImage")
            .field("attachment_name", &self.attachment_name)
            .finish_non_exhaustive()
    }
}

impl IntoResponse for TransformedImage {
    fn into_response(self) -> Response {
        let mut response = Response::new(self.body);
        *response.status_mut() = StatusCode::OK;
        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(IMAGE_JPEG));
        if let Some(name) = self.attachment_name {
            if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename={name}")) {
                headers.insert(header::CONTENT_DISPOSITION, value);
            }
        }
        response
    }
}
