//! HTTP server setup for the three pipeline stages.
//!
//! # Responsibilities
//! - Build the Axum router for one stage with its state
//! - Create process-wide resources (pooled clients, blob store) at startup
//! - Wire up middleware (tracing, request ID, timeout, body limits, metrics)
//! - Serve over plain TCP or TLS with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::Uri,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{ListenerConfig, PipelineConfig};
use crate::http::request::{make_span, propagate_request_id_layer, set_request_id_layer};
use crate::http::status::get_status;
use crate::ingestion::{upload_handler, IngestionState, RelayClient, Uploader, UPLOAD_PATH};
use crate::lifecycle::shutdown;
use crate::net::tls::load_tls_config;
use crate::observability::metrics;
use crate::pipeline::{FailureKind, HopError, PipelineFailure, Stage};
use crate::relay::{forward_handler, Forwarder, RelayState, TransformClient, RELAY_PATH};
use crate::resilience::HopTimeouts;
use crate::storage::{BlobError, BlobStore};
use crate::transform::{grayscale_handler, GrayscaleTransform, TransformState, TRANSFORM_PATH};

/// Time allowed for in-flight requests to finish once shutdown starts.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("blob store unavailable: {0}")]
    Blob(#[from] BlobError),

    #[error("outbound client setup failed: {0}")]
    Client(#[from] HopError),

    #[error("invalid transform URL {url:?}: {reason}")]
    TransformUrl { url: String, reason: String },

    #[error("invalid bind address {0:?}")]
    BindAddress(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP server for one pipeline stage.
pub struct HttpServer {
    stage: Stage,
    router: Router,
    listener: ListenerConfig,
}

impl HttpServer {
    /// Create the server for `stage` from the shared configuration.
    pub fn new(stage: Stage, config: &PipelineConfig) -> Result<Self, ServerError> {
        let routes = match stage {
            Stage::Ingestion => Self::ingestion_routes(config)?,
            Stage::Relay => Self::relay_routes(config)?,
            Stage::Transform => Self::transform_routes(config),
        };
        let router = Self::build_router(stage, config, routes);

        Ok(Self {
            stage,
            router,
            listener: config.listener(stage).clone(),
        })
    }

    fn ingestion_routes(config: &PipelineConfig) -> Result<Router, ServerError> {
        let store = Arc::new(BlobStore::open(&config.blob_store.root)?);
        let relay = RelayClient::new(
            &config.ingestion.communication_api_url,
            HopTimeouts::from(&config.timeouts),
        )?;
        tracing::info!(relay = %relay.endpoint(), "Ingestion stage configured");

        let state = IngestionState {
            uploader: Uploader::new(store, relay, config.ingestion.retain_uploads),
        };
        Ok(Router::new()
            .route(UPLOAD_PATH, post(upload_handler))
            .layer(DefaultBodyLimit::max(config.ingestion.max_upload_bytes))
            .with_state(state))
    }

    fn relay_routes(config: &PipelineConfig) -> Result<Router, ServerError> {
        let store = Arc::new(BlobStore::open(&config.blob_store.root)?);
        let endpoint: Uri =
            config
                .relay
                .transform_url
                .parse()
                .map_err(|e: axum::http::uri::InvalidUri| ServerError::TransformUrl {
                    url: config.relay.transform_url.clone(),
                    reason: e.to_string(),
                })?;
        tracing::info!(transform = %endpoint, "Relay stage configured");

        let transform = TransformClient::new(endpoint, HopTimeouts::from(&config.timeouts));
        let state = RelayState {
            forwarder: Forwarder::new(store, transform),
        };
        Ok(Router::new()
            .route(RELAY_PATH, post(forward_handler))
            .with_state(state))
    }

    fn transform_routes(config: &PipelineConfig) -> Router {
        let state = TransformState {
            transform: GrayscaleTransform::new(config.transform.jpeg_quality),
        };
        Router::new()
            .route(TRANSFORM_PATH, post(grayscale_handler))
            .layer(DefaultBodyLimit::max(config.transform.max_body_bytes))
            .with_state(state)
    }

    /// Attach the shared middleware stack. The request id is set first so
    /// the trace span and every handler see it. A request outliving
    /// `request_secs` is answered like any other failure of `stage`.
    fn build_router(stage: Stage, config: &PipelineConfig, routes: Router) -> Router {
        let (timeout_status, _) =
            PipelineFailure::new(stage, FailureKind::DownstreamUnavailable, "request timed out")
                .public_response();

        routes
            .route("/health", get(move || get_status(stage)))
            .layer(middleware::from_fn(
                move |request: Request, next: middleware::Next| {
                    metrics::track_requests(stage, request, next)
                },
            ))
            .layer(TimeoutLayer::with_status_code(
                timeout_status,
                Duration::from_secs(config.timeouts.request_secs),
            ))
            .layer(TraceLayer::new_for_http().make_span_with(make_span(stage.as_str())))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    pub fn listener_config(&self) -> &ListenerConfig {
        &self.listener
    }

    /// Run on an already-bound plain TCP listener until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(stage = %self.stage, address = %addr, "HTTP server starting");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown::recv(shutdown))
            .await?;

        tracing::info!(stage = %self.stage, "HTTP server stopped");
        Ok(())
    }

    /// Bind according to the listener config (TLS when configured) and run
    /// until `shutdown` fires.
    pub async fn serve(self, shutdown: broadcast::Receiver<()>) -> Result<(), ServerError> {
        let Some(tls) = self.listener.tls.clone() else {
            let listener = TcpListener::bind(&self.listener.bind_address).await?;
            return Ok(self.run(listener, shutdown).await?);
        };

        let addr: SocketAddr = self
            .listener
            .bind_address
            .parse()
            .map_err(|_| ServerError::BindAddress(self.listener.bind_address.clone()))?;
        let rustls = load_tls_config(&tls).await?;

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            shutdown::recv(shutdown).await;
            drain.graceful_shutdown(Some(DRAIN_TIMEOUT));
        });

        tracing::info!(stage = %self.stage, address = %addr, "HTTPS server starting");
        axum_server::bind_rustls(addr, rustls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!(stage = %self.stage, "HTTPS server stopped");
        Ok(())
    }
}
