//! Tesseract CLI adapter.

use super::{OcrOutput, RecognitionLevel, TextRecognizer};
use crate::error::RecognitionError;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct TesseractRecognizer {
    binary: PathBuf,
    language: String,
    level: RecognitionLevel,
    timeout: Duration,
}

impl TesseractRecognizer {
    /// Locate `tesseract` on `PATH`.
    pub fn detect(level: RecognitionLevel, timeout: Duration) -> Result<Self, RecognitionError> {
        let binary = which::which("tesseract")
            .map_err(|e| RecognitionError::EngineMissing(format!("tesseract: {}", e)))?;
        log::info!("[OCR] Using {}", binary.display());
        Ok(Self {
            binary,
            language: "eng".to_string(),
            level,
            timeout,
        })
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    fn args(&self, image_path: &Path) -> Vec<String> {
        let mut args = vec![
            image_path.to_string_lossy().to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            self.language.clone(),
            // Single uniform block: keeps code lines in order.
            "--psm".to_string(),
            "6".to_string(),
        ];
        if self.level == RecognitionLevel::Accurate {
            args.push("-c".to_string());
            args.push("preserve_interword_spaces=1".to_string());
        }
        args
    }
}

#[async_trait::async_trait]
impl TextRecognizer for TesseractRecognizer {
    async fn recognize(&self, image_path: &Path) -> Result<OcrOutput, RecognitionError> {
        let start = std::time::Instant::now();

        let child = tokio::process::Command::new(&self.binary)
            .args(self.args(image_path))
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RecognitionError::Engine(format!("spawn failed: {}", e)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| RecognitionError::Timeout(self.timeout))?
            .map_err(|e| RecognitionError::Engine(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            log::error!("[OCR] tesseract exited with {}: {}", output.status, stderr.trim());
            return Err(RecognitionError::Engine(format!(
                "tesseract exited with {}",
                output.status
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        let result = OcrOutput::new(text, latency_ms, self.level);
        log::info!(
            "[OCR] Extracted {} chars in {:.0}ms ({:?})",
            result.char_count,
            latency_ms,
            self.level
        );
        Ok(result)
    }
}
