//! Forwarding of stored images to the transform stage.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request, Uri},
};
use hyper::body::Incoming;
use hyper::Response;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::http::request::X_REQUEST_ID;
use crate::observability::metrics;
use crate::pipeline::{
    HopError, ImageBlob, ImageReference, PipelineFailure, PipelineOutcome, Stage,
    TransformedImage,
};
use crate::resilience::{with_deadline, HopTimeouts};
use crate::storage::BlobStore;

/// Pooled HTTP client bound to the transform endpoint.
#[derive(Clone)]
pub struct TransformClient {
    client: Client<HttpConnector, Body>,
    endpoint: Uri,
    timeouts: HopTimeouts,
}

impl TransformClient {
    pub fn new(endpoint: Uri, timeouts: HopTimeouts) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeouts.connect));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self {
            client,
            endpoint,
            timeouts,
        }
    }

    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    /// POST `blob` to the transform stage. Only a 2xx response is returned;
    /// its body is left unread so the caller can stream it.
    pub async fn transform(
        &self,
        blob: ImageBlob,
        request_id: &str,
    ) -> Result<Response<Incoming>, HopError> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.clone())
            .header(header::CONTENT_LENGTH, blob.len());

        if let Ok(value) = HeaderValue::from_str(&blob.media_type) {
            builder = builder.header(header::CONTENT_TYPE, value);
        }
        if let Ok(value) = HeaderValue::from_str(request_id) {
            builder = builder.header(X_REQUEST_ID, value);
        }

        let request = builder
            .body(Body::from(blob.bytes))
            .map_err(|e| HopError::Request {
                target: Stage::Transform,
                reason: e.to_string(),
            })?;

        with_deadline(Stage::Transform, self.timeouts.total, async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| HopError::Unreachable {
                    target: Stage::Transform,
                    reason: e.to_string(),
                })?;

            if !response.status().is_success() {
                return Err(HopError::Status {
                    target: Stage::Transform,
                    status: response.status(),
                });
            }
            Ok(response)
        })
        .await
    }
}

/// Relay's `forwardForTransform`: resolve, forward, stream back.
#[derive(Clone)]
pub struct Forwarder {
    store: Arc<BlobStore>,
    transform: TransformClient,
}

impl Forwarder {
    pub fn new(store: Arc<BlobStore>, transform: TransformClient) -> Self {
        Self { store, transform }
    }

    pub async fn forward_for_transform(
        &self,
        reference: &ImageReference,
        request_id: &str,
    ) -> PipelineOutcome {
        let bytes = self
            .store
            .get(reference)
            .await
            .map_err(|e| PipelineFailure::storage(Stage::Relay, &e))?;

        let blob = ImageBlob::sniffed(bytes);
        tracing::debug!(
            request_id = %request_id,
            reference = %reference,
            media_type = %blob.media_type,
            bytes = blob.len(),
            endpoint = %self.transform.endpoint(),
            "Forwarding image to transform stage"
        );

        let start = Instant::now();
        match self.transform.transform(blob, request_id).await {
            Ok(response) => {
                metrics::record_hop(Stage::Relay, Stage::Transform, "success", start);
                Ok(TransformedImage::streaming(Body::new(response.into_body())))
            }
            Err(e) => {
                metrics::record_hop(Stage::Relay, Stage::Transform, "failure", start);
                Err(PipelineFailure::downstream(Stage::Relay, &e))
            }
        }
    }
}
