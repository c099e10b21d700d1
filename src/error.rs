//! Error taxonomy for the capture and analysis pipeline.
//!
//! Each failure domain gets its own enum so callers can tell a storage
//! hiccup (usually logged and ignored) from a transport failure (surfaced
//! to the UI as a processing error). Interpretation has no error type:
//! malformed model output always degrades into a best-effort result.

use std::path::PathBuf;
use std::time::Duration;

/// File I/O failures from the capture store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Capture not found in any queue: {0}")]
    NotQueued(PathBuf),
}

/// Failures of the OS screenshot collaborator.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("No screenshot tool available on this system")]
    Unavailable,

    #[error("Screenshot tool failed: {0}")]
    Tool(String),

    #[error("Screenshot encode failed: {0}")]
    Encode(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The normalization cascade ran out of fallbacks.
#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("Source image missing: {0}")]
    MissingSource(PathBuf),

    #[error("All normalization strategies failed for {path}: {reason}")]
    Exhausted { path: PathBuf, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    #[error("OCR engine not found: {0}")]
    EngineMissing(String),

    #[error("OCR engine failed: {0}")]
    Engine(String),

    #[error("OCR timed out after {0:?}")]
    Timeout(Duration),
}

/// Inference failures. `Cancelled` is not a user-visible error: a superseded
/// run stops quietly.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Inference cancelled")]
    Cancelled,

    #[error("Inference timed out after {0:?}")]
    Timeout(Duration),

    #[error("No API key configured ({0}). Add your key in settings or the environment.")]
    NotConfigured(String),

    #[error("Inference backend error: {0}")]
    Backend(String),
}

impl InferenceError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, InferenceError::Cancelled)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to write settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Keyring error: {0}")]
    Keyring(String),
}

/// Why a pipeline run stopped early.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    Recognition(#[from] RecognitionError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Pipeline superseded")]
    Superseded,

    #[error("Preprocessing task failed: {0}")]
    Task(String),
}

impl PipelineError {
    /// Superseded and cancelled runs end without an error event.
    pub fn is_silent(&self) -> bool {
        match self {
            PipelineError::Superseded => true,
            PipelineError::Inference(e) => e.is_cancelled(),
            _ => false,
        }
    }
}
