//! Screen capture domain — public API.
//!
//! This module owns captures from the moment they are written to disk until
//! they are deleted: the on-disk store, the two capture queues, and the
//! screenshot collaborators. External code should only use the items
//! re-exported here.

mod queue;
mod screenshot;
mod store;

pub use queue::{CaptureQueue, EnqueueOutcome, PRIMARY_CAPACITY};
pub use screenshot::{default_capturer, CommandCapturer, ScreenCapturer};
#[cfg(feature = "screen-capture")]
pub use screenshot::MonitorCapturer;
pub use store::{CaptureStore, FsCaptureStore};

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Longest edge of the preview thumbnail, in pixels.
const PREVIEW_MAX_EDGE: u32 = 320;

/// Which of the two capture buffers an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueKind {
    /// The current problem (bounded).
    Primary,
    /// Follow-up context for debugging (unbounded).
    Secondary,
}

impl std::fmt::Display for QueueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueKind::Primary => f.write_str("primary"),
            QueueKind::Secondary => f.write_str("secondary"),
        }
    }
}

/// A stored screenshot. The path doubles as the stable identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capture {
    pub path: PathBuf,
    /// `data:image/png;base64,...` thumbnail, empty if it could not be built.
    pub preview: String,
}

impl Capture {
    pub fn new(path: impl Into<PathBuf>, preview: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            preview: preview.into(),
        }
    }

    /// Build a capture for an image already on disk, deriving its preview.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let preview = build_preview(&path).unwrap_or_else(|e| {
            log::warn!("[CAPTURE] Preview failed for {}: {}", path.display(), e);
            String::new()
        });
        Self { path, preview }
    }

    pub fn id(&self) -> String {
        self.path.to_string_lossy().to_string()
    }
}

/// Path of a file derived from `raw`, written alongside it.
///
/// `shot.png` with tag `normalized` becomes `shot.normalized.png`.
pub fn derived_path(raw: &Path, tag: &str) -> PathBuf {
    let stem = raw
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "capture".to_string());
    raw.with_file_name(format!("{}.{}.png", stem, tag))
}

/// Encode a small PNG thumbnail of `path` as a data URL.
pub fn build_preview(path: &Path) -> Result<String, image::ImageError> {
    let img = image::open(path)?;
    let thumb = img.thumbnail(PREVIEW_MAX_EDGE, PREVIEW_MAX_EDGE);
    let mut png_bytes = Vec::new();
    thumb.write_to(
        &mut std::io::Cursor::new(&mut png_bytes),
        image::ImageFormat::Png,
    )?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(&png_bytes);
    Ok(format!("data:image/png;base64,{}", encoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_path_sits_next_to_source() {
        let raw = Path::new("/tmp/shots/capture-1.png");
        assert_eq!(
            derived_path(raw, "normalized"),
            PathBuf::from("/tmp/shots/capture-1.normalized.png")
        );
    }

    #[test]
    fn preview_is_png_data_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        image::RgbImage::from_pixel(800, 400, image::Rgb([200, 10, 10]))
            .save(&path)
            .unwrap();

        let capture = Capture::from_path(&path);
        assert!(capture.preview.starts_with("data:image/png;base64,"));
        assert_eq!(capture.id(), path.to_string_lossy());
    }

    #[test]
    fn preview_of_unreadable_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-an-image.png");
        std::fs::write(&path, b"garbage").unwrap();
        assert!(Capture::from_path(&path).preview.is_empty());
    }
}
