//! Filesystem blob store holding uploads for the length of one traversal.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::body::Bytes;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::pipeline::{ImageBlob, ImageReference};

const MAX_NAME_SUFFIX: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("reference {0:?} is empty")]
    EmptyReference(String),

    #[error("reference {0:?} resolves outside the blob store")]
    OutsideRoot(String),

    #[error("blob {0:?} not found")]
    NotFound(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Directory-backed store shared by the ingestion and relay stages.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Open (creating if needed) the store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, BlobError> {
        let root = root.as_ref();
        std::fs::create_dir_all(root).map_err(|source| BlobError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        let root = root.canonicalize().map_err(|source| BlobError::Io {
            path: root.to_path_buf(),
            source,
        })?;

        tracing::info!(root = %root.display(), "Blob store opened");
        Ok(Self { root })
    }

    /// Persist `blob` under a freshly generated key.
    pub async fn put(&self, blob: &ImageBlob) -> Result<ImageReference, BlobError> {
        let path = self.root.join(generate_key(blob.file_name.as_deref()));

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|source| BlobError::Io {
                path: path.clone(),
                source,
            })?;
        let written = match file.write_all(&blob.bytes).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };
        if let Err(source) = written {
            drop(file);
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial blob");
            }
            return Err(BlobError::Io { path, source });
        }

        tracing::debug!(
            path = %path.display(),
            bytes = blob.len(),
            original_name = ?blob.file_name,
            "Blob stored"
        );
        Ok(ImageReference::from(path))
    }

    /// Read back the bytes behind `reference`.
    pub async fn get(&self, reference: &ImageReference) -> Result<Bytes, BlobError> {
        let path = self.resolve(reference)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Bytes::from(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(BlobError::NotFound(reference.to_string()))
            }
            Err(source) => Err(BlobError::Io { path, source }),
        }
    }

    /// Delete the blob. Missing blobs are not an error.
    pub async fn remove(&self, reference: &ImageReference) -> Result<(), BlobError> {
        let path = self.resolve(reference)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(BlobError::Io { path, source }),
        }
    }

    /// Map a reference to a path, refusing anything that escapes the root.
    fn resolve(&self, reference: &ImageReference) -> Result<PathBuf, BlobError> {
        let raw = reference.as_str();
        if raw.is_empty() {
            return Err(BlobError::EmptyReference(raw.to_string()));
        }

        let path = reference.as_path();
        if path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::CurDir))
        {
            return Err(BlobError::OutsideRoot(raw.to_string()));
        }

        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        if path.parent() != Some(self.root.as_path()) {
            return Err(BlobError::OutsideRoot(raw.to_string()));
        }
        Ok(path)
    }
}

/// A stored blob that is removed when the lease goes away.
///
/// [`release`](Self::release) removes it inline. Dropping an armed lease,
/// as happens when the owning request future is cancelled, hands the
/// removal to a spawned task instead.
pub struct BlobLease {
    store: Arc<BlobStore>,
    reference: ImageReference,
    armed: bool,
}

impl BlobLease {
    pub fn new(store: Arc<BlobStore>, reference: ImageReference) -> Self {
        Self {
            store,
            reference,
            armed: true,
        }
    }

    pub fn reference(&self) -> &ImageReference {
        &self.reference
    }

    /// Leave the blob on disk.
    pub fn keep(mut self) {
        self.armed = false;
    }

    /// Remove the blob now.
    pub async fn release(mut self) -> Result<(), BlobError> {
        let result = self.store.remove(&self.reference).await;
        self.armed = false;
        result
    }
}

impl Drop for BlobLease {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let store = self.store.clone();
        let reference = self.reference.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = store.remove(&reference).await {
                        tracing::warn!(reference = %reference, error = %e, "Failed to remove abandoned blob");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(reference = %self.reference, "No runtime to remove abandoned blob");
            }
        }
    }
}

/// `<uuid>` or `<uuid>-<sanitized original name>`.
fn generate_key(file_name: Option<&str>) -> String {
    let id = Uuid::new_v4().simple().to_string();
    match file_name.map(sanitize_file_name).filter(|s| !s.is_empty()) {
        Some(name) => format!("{id}-{name}"),
        None => id,
    }
}

fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_SUFFIX)
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}
