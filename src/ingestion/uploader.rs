//! Upload orchestration: store, relay, clean up.

use std::sync::Arc;
use std::time::Instant;

use crate::ingestion::relay_client::RelayClient;
use crate::observability::metrics;
use crate::pipeline::{
    ImageBlob, PipelineFailure, PipelineOutcome, Stage, TransformedImage,
};
use crate::storage::{BlobLease, BlobStore};

#[derive(Clone)]
pub struct Uploader {
    store: Arc<BlobStore>,
    relay: RelayClient,
    retain_uploads: bool,
}

impl Uploader {
    pub fn new(store: Arc<BlobStore>, relay: RelayClient, retain_uploads: bool) -> Self {
        Self {
            store,
            relay,
            retain_uploads,
        }
    }

    /// Ingestion's `uploadImage`: persist `blob`, drive the relay, return
    /// the transformed JPEG.
    pub async fn upload_image(&self, blob: ImageBlob, request_id: &str) -> PipelineOutcome {
        if blob.is_empty() {
            return Err(PipelineFailure::invalid_input(
                Stage::Ingestion,
                "uploaded file is empty",
            ));
        }

        let reference = self
            .store
            .put(&blob)
            .await
            .map_err(|e| PipelineFailure::storage(Stage::Ingestion, &e))?;
        // Removed on every exit, including cancellation of this future.
        let lease = BlobLease::new(self.store.clone(), reference);

        tracing::info!(
            request_id = %request_id,
            reference = %lease.reference(),
            original_name = ?blob.file_name,
            media_type = %blob.media_type,
            bytes = blob.len(),
            "Upload stored, calling relay"
        );

        let start = Instant::now();
        let result = self.relay.forward(lease.reference(), request_id).await;
        metrics::record_hop(
            Stage::Ingestion,
            Stage::Relay,
            if result.is_ok() { "success" } else { "failure" },
            start,
        );

        if self.retain_uploads {
            lease.keep();
        } else if let Err(e) = lease.release().await {
            tracing::warn!(
                request_id = %request_id,
                error = %e,
                "Failed to remove stored upload"
            );
        }

        result
            .map(|jpeg| TransformedImage::buffered(jpeg))
            .map_err(|e| PipelineFailure::downstream(Stage::Ingestion, &e))
    }
}
