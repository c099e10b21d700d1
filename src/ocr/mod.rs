//! OCR domain — text recognition behind a narrow trait.
//!
//! The pipeline only sees [`TextRecognizer`]. The shipped adapter shells out
//! to the `tesseract` CLI; tests plug in their own implementations.
//! External code should only use the items exported here.

pub mod heuristics;
mod tesseract;

pub use tesseract::TesseractRecognizer;

use crate::error::RecognitionError;
use std::path::Path;

/// Recognition level. `Accurate` keeps interword spacing, which matters for
/// indented code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecognitionLevel {
    Accurate,
    #[default]
    Fast,
}

impl RecognitionLevel {
    /// Parse an `OCR_MODE` style value; anything unknown is `Fast`.
    pub fn from_mode(mode: &str) -> Self {
        match mode.to_lowercase().as_str() {
            "accurate" => RecognitionLevel::Accurate,
            _ => RecognitionLevel::Fast,
        }
    }
}

/// Result of OCR processing.
#[derive(Debug, Clone)]
pub struct OcrOutput {
    pub text: String,
    pub char_count: usize,
    pub latency_ms: f64,
    pub recognition_level: RecognitionLevel,
}

impl OcrOutput {
    pub fn new(text: String, latency_ms: f64, recognition_level: RecognitionLevel) -> Self {
        Self {
            char_count: text.chars().count(),
            text,
            latency_ms,
            recognition_level,
        }
    }
}

/// Extracts text from an image file.
///
/// A call runs to completion or failure; it is never cancelled midway, but
/// implementations must bound it with a local timeout.
#[async_trait::async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image_path: &Path) -> Result<OcrOutput, RecognitionError>;
}

/// Stands in when no OCR engine could be found; every call fails with the
/// detection error so the pipeline reports it instead of crashing.
pub struct MissingRecognizer {
    reason: String,
}

impl MissingRecognizer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait::async_trait]
impl TextRecognizer for MissingRecognizer {
    async fn recognize(&self, _image_path: &Path) -> Result<OcrOutput, RecognitionError> {
        Err(RecognitionError::EngineMissing(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parsing_defaults_to_fast() {
        assert_eq!(RecognitionLevel::from_mode("Accurate"), RecognitionLevel::Accurate);
        assert_eq!(RecognitionLevel::from_mode("fast"), RecognitionLevel::Fast);
        assert_eq!(RecognitionLevel::from_mode("bogus"), RecognitionLevel::Fast);
    }

    #[tokio::test]
    async fn missing_recognizer_reports_the_reason() {
        let recognizer = MissingRecognizer::new("tesseract: not found");
        let err = recognizer.recognize(Path::new("x.png")).await.unwrap_err();
        assert!(err.to_string().contains("tesseract: not found"));
    }

    #[test]
    fn output_counts_chars_not_bytes() {
        let out = OcrOutput::new("héllo".to_string(), 1.0, RecognitionLevel::Fast);
        assert_eq!(out.char_count, 5);
    }
}
