//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, routing::post, Router};
use grayscale_relay::config::PipelineConfig;
use grayscale_relay::{HttpServer, Shutdown, Stage};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// A full pipeline running on ephemeral local ports.
pub struct Pipeline {
    pub ingestion: SocketAddr,
    pub relay: SocketAddr,
    pub transform: SocketAddr,
    pub blob_dir: TempDir,
    pub shutdown: Shutdown,
}

impl Pipeline {
    pub fn upload_url(&self) -> String {
        format!("http://{}/api/image/upload", self.ingestion)
    }

    pub fn relay_url(&self) -> String {
        format!("http://{}/api/communication/webapp", self.relay)
    }

    pub fn transform_url(&self) -> String {
        format!("http://{}/api/ImageGrayscaleFunction", self.transform)
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config with short timeouts and a fresh blob directory.
pub fn test_config(blob_dir: &TempDir) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.blob_store.root = blob_dir.path().to_path_buf();
    config.timeouts.connect_secs = 2;
    config.timeouts.hop_secs = 10;
    config.timeouts.request_secs = 20;
    config
}

/// Start all three stages. `transform_override` replaces the real transform
/// stage address (e.g. a closed port or a mock).
pub async fn start_pipeline(transform_override: Option<SocketAddr>) -> Pipeline {
    start_pipeline_with(transform_override, |_| {}).await
}

pub async fn start_pipeline_with<F>(transform_override: Option<SocketAddr>, tweak: F) -> Pipeline
where
    F: FnOnce(&mut PipelineConfig),
{
    let blob_dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&blob_dir);
    let shutdown = Shutdown::new();

    let transform_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let transform = transform_listener.local_addr().unwrap();
    let relay_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let relay = relay_listener.local_addr().unwrap();
    let ingestion_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let ingestion = ingestion_listener.local_addr().unwrap();

    let transform_target = transform_override.unwrap_or(transform);
    config.relay.transform_url = format!("http://{}/api/ImageGrayscaleFunction", transform_target);
    config.ingestion.communication_api_url = format!("http://{}", relay);
    tweak(&mut config);

    for (stage, listener) in [
        (Stage::Transform, transform_listener),
        (Stage::Relay, relay_listener),
        (Stage::Ingestion, ingestion_listener),
    ] {
        let server = HttpServer::new(stage, &config).unwrap();
        let rx = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, rx).await;
        });
    }

    Pipeline {
        ingestion,
        relay,
        transform,
        blob_dir,
        shutdown,
    }
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Start a mock transform stage answering every request with `status`.
/// Returns its address and a hit counter.
pub async fn start_mock_transform(status: StatusCode) -> (SocketAddr, Arc<AtomicU32>) {
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();
    let app = Router::new().route(
        "/api/ImageGrayscaleFunction",
        post(move |_body: axum::body::Bytes| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                status
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, hits)
}

/// A transform address that accepts connections and never answers.
pub async fn start_hanging_transform() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// A colourful test image encoded as `format`.
pub fn sample_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + y) * 7 % 256) as u8,
        ])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img).write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub fn sample_jpeg(width: u32, height: u32) -> Vec<u8> {
    sample_image(width, height, ImageFormat::Jpeg)
}

/// Decode `bytes` and check every pixel has R=G=B.
pub fn assert_grayscale_jpeg(bytes: &[u8]) -> (u32, u32) {
    assert_eq!(image::guess_format(bytes).unwrap(), ImageFormat::Jpeg);
    let decoded = image::load_from_memory(bytes).unwrap().to_rgb8();
    for pixel in decoded.pixels() {
        let [r, g, b] = pixel.0;
        assert!(r == g && g == b, "pixel {:?} is not gray", pixel);
    }
    decoded.dimensions()
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Files currently in the blob directory.
pub fn stored_blobs(dir: &TempDir) -> usize {
    std::fs::read_dir(dir.path()).unwrap().count()
}

/// Poll until the blob directory holds exactly `expected` files.
pub async fn wait_for_blobs(dir: &TempDir, expected: usize) -> bool {
    for _ in 0..100 {
        if stored_blobs(dir) == expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}
