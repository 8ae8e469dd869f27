//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the pipeline.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::pipeline::Stage;

/// Root configuration shared by all three stages.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upload-facing stage.
    pub ingestion: IngestionConfig,

    /// Reference-resolving relay.
    pub relay: RelayConfig,

    /// Grayscale transform.
    pub transform: TransformConfig,

    /// Where uploads are held during a traversal.
    pub blob_store: BlobStoreConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl PipelineConfig {
    /// Listener settings of `stage`.
    pub fn listener(&self, stage: Stage) -> &ListenerConfig {
        match stage {
            Stage::Ingestion => &self.ingestion.listener,
            Stage::Relay => &self.relay.listener,
            Stage::Transform => &self.transform.listener,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:7272").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl ListenerConfig {
    fn on(bind_address: &str) -> Self {
        Self {
            bind_address: bind_address.to_string(),
            tls: None,
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self::on("127.0.0.1:8080")
    }
}

/// TLS configuration for a listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IngestionConfig {
    pub listener: ListenerConfig,

    /// Base URL of the relay stage.
    #[serde(alias = "CommunicationApiUrl")]
    pub communication_api_url: String,

    /// Largest accepted upload in bytes.
    pub max_upload_bytes: usize,

    /// Keep uploads in the blob store after the traversal ends.
    pub retain_uploads: bool,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::on("127.0.0.1:5000"),
            communication_api_url: "http://127.0.0.1:7263".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            retain_uploads: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    pub listener: ListenerConfig,

    /// Full URL of the transform endpoint. Plain HTTP only.
    pub transform_url: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::on("127.0.0.1:7263"),
            transform_url: "http://127.0.0.1:7272/api/ImageGrayscaleFunction".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransformConfig {
    pub listener: ListenerConfig,

    /// Largest accepted image body in bytes.
    pub max_body_bytes: usize,

    /// JPEG encoder quality (1-100).
    pub jpeg_quality: u8,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::on("127.0.0.1:7272"),
            max_body_bytes: 10 * 1024 * 1024,
            jpeg_quality: 90,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlobStoreConfig {
    /// Directory holding uploads. Ingestion and relay must agree on it.
    pub root: PathBuf,
}

impl Default for BlobStoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("Images"),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout for outbound hops, in seconds.
    pub connect_secs: u64,

    /// Total time allowed for one outbound hop, in seconds.
    pub hop_secs: u64,

    /// Server-side limit on handling one inbound request, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            hop_secs: 30,
            request_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
