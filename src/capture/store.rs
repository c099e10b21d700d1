//! On-disk capture storage.

use super::QueueKind;
use crate::error::StorageError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Storage collaborator used by the queues and the pipeline.
pub trait CaptureStore: Send + Sync {
    /// Persist raw PNG bytes for a new capture and return its path.
    fn write_capture(&self, kind: QueueKind, png_bytes: &[u8]) -> Result<PathBuf, StorageError>;

    /// Delete a capture file (and anything derived from it).
    fn delete_file(&self, path: &Path) -> Result<(), StorageError>;

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, StorageError>;

    fn file_exists(&self, path: &Path) -> bool;
}

/// Stores captures as timestamped PNGs, one directory per queue.
pub struct FsCaptureStore {
    primary_dir: PathBuf,
    secondary_dir: PathBuf,
    counter: AtomicU64,
}

impl FsCaptureStore {
    pub fn new(primary_dir: impl Into<PathBuf>, secondary_dir: impl Into<PathBuf>) -> Self {
        Self {
            primary_dir: primary_dir.into(),
            secondary_dir: secondary_dir.into(),
            counter: AtomicU64::new(0),
        }
    }

    pub fn dir_for(&self, kind: QueueKind) -> &Path {
        match kind {
            QueueKind::Primary => &self.primary_dir,
            QueueKind::Secondary => &self.secondary_dir,
        }
    }
}

impl CaptureStore for FsCaptureStore {
    fn write_capture(&self, kind: QueueKind, png_bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let dir = self.dir_for(kind);
        std::fs::create_dir_all(dir).map_err(|source| StorageError::Write {
            path: dir.to_path_buf(),
            source,
        })?;

        let epoch_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let path = dir.join(format!("capture-{}-{}.png", epoch_ms, seq));

        std::fs::write(&path, png_bytes).map_err(|source| StorageError::Write {
            path: path.clone(),
            source,
        })?;
        log::info!(
            "[CAPTURE] Stored {} capture: {} ({} bytes)",
            kind,
            path.display(),
            png_bytes.len()
        );
        Ok(path)
    }

    fn delete_file(&self, path: &Path) -> Result<(), StorageError> {
        std::fs::remove_file(path).map_err(|source| StorageError::Delete {
            path: path.to_path_buf(),
            source,
        })?;

        // Derived artifacts are best-effort; they may never have been built.
        let normalized = super::derived_path(path, "normalized");
        if normalized.exists() {
            if let Err(e) = std::fs::remove_file(&normalized) {
                log::warn!(
                    "[CAPTURE] Failed to delete derived file {}: {}",
                    normalized.display(),
                    e
                );
            }
        }
        Ok(())
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        std::fs::read(path).map_err(|source| StorageError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
