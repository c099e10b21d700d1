//! Shared fixtures for coordinator integration tests: scripted OCR and
//! inference backends, a fake screen capturer and a harness that wires
//! them into a real Coordinator over a temp directory.

#![allow(dead_code)]

use snapsolve_lib::capture::{FsCaptureStore, ScreenCapturer};
use snapsolve_lib::error::{CaptureError, InferenceError, RecognitionError};
use snapsolve_lib::llm::{
    bounded, InferenceClient, InferencePayload, InferencePurpose, InferenceRequest,
};
use snapsolve_lib::ocr::{OcrOutput, RecognitionLevel, TextRecognizer};
use snapsolve_lib::pipeline::{
    ChannelSink, Collaborators, Coordinator, PipelineConfig, PipelineEvent,
};
use snapsolve_lib::preprocess::ImagePreprocessor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;

// ── Fixtures ─────────────────────────────────────────────────────────

/// Write a small PNG with some structure so the preprocessor has work to do.
pub fn write_png(dir: &Path, name: &str) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    let img = image::RgbImage::from_fn(48, 24, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 {
            image::Rgb([20, 20, 20])
        } else {
            image::Rgb([230, 230, 230])
        }
    });
    img.save(&path).unwrap();
    path
}

pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(16, 16, image::Rgb([255, 255, 255]));
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

// ── Scripted collaborators ───────────────────────────────────────────

pub struct ScriptedRecognizer {
    text: String,
}

impl ScriptedRecognizer {
    pub fn new(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl TextRecognizer for ScriptedRecognizer {
    async fn recognize(&self, image_path: &Path) -> Result<OcrOutput, RecognitionError> {
        assert!(image_path.is_file(), "OCR on missing file {}", image_path.display());
        Ok(OcrOutput::new(self.text.clone(), 1.0, RecognitionLevel::Fast))
    }
}

/// One recorded inference call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub purpose: InferencePurpose,
    pub is_image: bool,
}

/// Inference backend with canned replies per purpose.
///
/// Debug replies are numbered: the n-th debug call answers
/// `"Analysis n: off-by-one in the loop bound"`.
pub struct ScriptedInference {
    extract: Result<String, String>,
    solution: Result<String, String>,
    failing_debug_call: Option<usize>,
    delay: Duration,
    debug_delay: Option<Duration>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedInference {
    pub fn new(extract: &str, solution: &str) -> Self {
        Self {
            extract: Ok(extract.to_string()),
            solution: Ok(solution.to_string()),
            failing_debug_call: None,
            delay: Duration::ZERO,
            debug_delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_extract(mut self, message: &str) -> Self {
        self.extract = Err(message.to_string());
        self
    }

    pub fn failing_solution(mut self, message: &str) -> Self {
        self.solution = Err(message.to_string());
        self
    }

    pub fn failing_debug_call(mut self, n: usize) -> Self {
        self.failing_debug_call = Some(n);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Delay only debug-analysis calls; other purposes keep `with_delay`.
    pub fn with_debug_delay(mut self, delay: Duration) -> Self {
        self.debug_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, purpose: InferencePurpose) -> usize {
        self.calls().iter().filter(|c| c.purpose == purpose).count()
    }

    fn reply(&self, purpose: InferencePurpose, nth: usize) -> Result<String, InferenceError> {
        let scripted = match purpose {
            InferencePurpose::ExtractProblem => self.extract.clone(),
            InferencePurpose::GenerateSolution => self.solution.clone(),
            InferencePurpose::DebugAnalysis if self.failing_debug_call == Some(nth) => {
                Err(format!("debug call {} failed", nth))
            }
            InferencePurpose::DebugAnalysis => {
                Ok(format!("Analysis {}: off-by-one in the loop bound", nth))
            }
        };
        scripted.map_err(InferenceError::Backend)
    }
}

#[async_trait::async_trait]
impl InferenceClient for ScriptedInference {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn infer(
        &self,
        request: &InferenceRequest,
        cancel: &CancellationToken,
        timeout: Duration,
    ) -> Result<String, InferenceError> {
        let nth = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call {
                purpose: request.purpose,
                is_image: matches!(request.payload, InferencePayload::Image { .. }),
            });
            calls.iter().filter(|c| c.purpose == request.purpose).count()
        };
        let reply = self.reply(request.purpose, nth);
        let delay = match (request.purpose, self.debug_delay) {
            (InferencePurpose::DebugAnalysis, Some(delay)) => delay,
            _ => self.delay,
        };
        bounded(cancel, timeout, async move {
            tokio::time::sleep(delay).await;
            reply
        })
        .await
    }
}

pub struct FakeCapturer;

impl ScreenCapturer for FakeCapturer {
    fn capture_full_screen(&self) -> Result<Vec<u8>, CaptureError> {
        Ok(png_bytes())
    }
}

// ── Harness ──────────────────────────────────────────────────────────

pub struct Harness {
    pub coordinator: Arc<Coordinator>,
    pub events: UnboundedReceiver<PipelineEvent>,
    pub inference: Arc<ScriptedInference>,
    pub dir: TempDir,
}

impl Harness {
    pub fn new(recognizer: Arc<dyn TextRecognizer>, inference: ScriptedInference) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FsCaptureStore::new(
            dir.path().join("primary"),
            dir.path().join("secondary"),
        ));
        let inference = Arc::new(inference);
        let (sink, events) = ChannelSink::new();
        let config = PipelineConfig {
            extract_timeout: Duration::from_secs(5),
            solution_timeout: Duration::from_secs(5),
            debug_timeout: Duration::from_secs(5),
            solution_language: "python".to_string(),
        };
        let coordinator = Coordinator::new(
            Collaborators {
                store,
                recognizer,
                inference: inference.clone(),
                capturer: Arc::new(FakeCapturer),
                sink: Arc::new(sink),
            },
            ImagePreprocessor::default(),
            config,
        );
        Self {
            coordinator,
            events,
            inference,
            dir,
        }
    }

    /// Write a PNG into the test inbox and queue it.
    pub fn enqueue(&self, name: &str) -> PathBuf {
        let path = write_png(&self.dir.path().join("inbox"), name);
        self.coordinator.enqueue_capture(path.clone());
        path
    }

    /// Everything emitted so far.
    pub fn drain(&mut self) -> Vec<PipelineEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}

pub fn names(events: &[PipelineEvent]) -> Vec<&'static str> {
    events.iter().map(|e| e.name()).collect()
}

pub const SOLUTION_REPLY: &str = "Double the input and return it.\n\n```python\ndef foo(n):\n    return n * 2\n```\n\nTime complexity: O(1)\nSpace complexity: O(1)";
