//! The initial and debug pipeline bodies.
//!
//! Captures are processed strictly in queue order. The run's token is
//! checked before each capture, before each network call and (inside
//! `publish`) before every state change.

use super::coordinator::{Coordinator, RunHandle};
use super::events::PipelineEvent;
use super::state::{PipelinePhase, RunKind, ViewState};
use crate::capture::Capture;
use crate::error::PipelineError;
use crate::interpret::{interpret, interpret_solution};
use crate::llm::prompts::build_solution_message;
use crate::llm::{InferencePurpose, InferenceRequest};
use crate::ocr::heuristics::detect_code_structure;
use std::path::{Path, PathBuf};
use std::time::Instant;

impl Coordinator {
    pub(super) async fn run_initial(
        &self,
        run: &RunHandle,
        captures: Vec<Capture>,
    ) -> Result<(), PipelineError> {
        let total = captures.len();
        let mut analyses = Vec::with_capacity(total);
        let mut ocr_texts = Vec::with_capacity(total);

        for (i, capture) in captures.iter().enumerate() {
            // Stage 1: normalize
            self.checkpoint(run)?;
            let normalized = self.normalize(&capture.path).await?;

            // Stage 2: OCR. Runs to completion once started.
            let ocr = self.recognizer.recognize(&normalized).await?;
            log::info!(
                "[OCR] Capture {}/{}: {} chars in {:.0}ms ({:?}, has_code: {})",
                i + 1,
                total,
                ocr.char_count,
                ocr.latency_ms,
                ocr.recognition_level,
                detect_code_structure(&ocr.text)
            );
            ocr_texts.push(ocr.text);

            // Stage 3: model reads the normalized image
            self.checkpoint(run)?;
            let png = self.store.read_file(&normalized)?;
            let request = InferenceRequest::image(InferencePurpose::ExtractProblem, png);
            let analysis = self
                .inference
                .infer(&request, &run.token, self.config.extract_timeout)
                .await?;
            analyses.push(analysis);
        }

        // Stage 4: interpret. OCR text only fills what the model left empty.
        let mut problem = interpret(&analyses.join("\n\n"));
        problem.fill_missing_from(interpret(&ocr_texts.join("\n\n")));
        log::info!(
            "[PIPELINE] Problem extracted: {:?} ({} examples, {} constraints, {} chars of code)",
            problem.title,
            problem.examples.len(),
            problem.constraints.len(),
            problem.code.len()
        );

        let published = problem.clone();
        self.publish(run, move |state| {
            state.problem = Some(published.clone());
            state.solution = None;
            state.view = ViewState::Solutions;
            Ok(PipelineEvent::ProblemExtracted(published))
        })?;

        // Stage 5: solution generation
        self.checkpoint(run)?;
        let prompt = build_solution_message(&problem, &self.config.solution_language);
        let request = InferenceRequest::text(InferencePurpose::GenerateSolution, prompt);
        let raw = self
            .inference
            .infer(&request, &run.token, self.config.solution_timeout)
            .await?;
        let solution = interpret_solution(&raw);

        self.publish(run, move |state| {
            state.solution = Some(solution.clone());
            state.transition(RunKind::Initial, PipelinePhase::SolutionsReady);
            Ok(PipelineEvent::SolutionReady(solution))
        })
    }

    pub(super) async fn run_debug(
        &self,
        run: &RunHandle,
        captures: Vec<Capture>,
    ) -> Result<(), PipelineError> {
        let total = captures.len();
        let mut sections = Vec::with_capacity(total);

        for (i, capture) in captures.iter().enumerate() {
            self.checkpoint(run)?;
            let normalized = self.normalize(&capture.path).await?;

            self.checkpoint(run)?;
            let png = self.store.read_file(&normalized)?;
            let request = InferenceRequest::image(InferencePurpose::DebugAnalysis, png);
            let analysis = self
                .inference
                .infer(&request, &run.token, self.config.debug_timeout)
                .await?;
            log::info!(
                "[DEBUG] Capture {}/{} analysed ({} chars)",
                i + 1,
                total,
                analysis.len()
            );
            sections.push(format!("Screenshot {}:\n{}", i + 1, analysis.trim()));
        }

        // A failed capture above aborts the batch: nothing is merged.
        let merged = sections.join("\n\n");
        self.publish(run, move |state| {
            let problem = state.problem.as_mut().ok_or(PipelineError::Superseded)?;
            problem.extra_info = Some(merged);
            let updated = problem.clone();
            state.view = ViewState::Debug;
            state.transition(RunKind::Debug, PipelinePhase::DebugReady);
            Ok(PipelineEvent::DebugReady(updated))
        })
    }

    /// Normalize off the async runtime; image work is CPU-bound.
    async fn normalize(&self, raw: &Path) -> Result<PathBuf, PipelineError> {
        let start = Instant::now();
        let preprocessor = self.preprocessor.clone();
        let raw = raw.to_path_buf();
        let (path, quality) =
            tokio::task::spawn_blocking(move || preprocessor.normalize_with_quality(&raw))
                .await
                .map_err(|e| PipelineError::Task(e.to_string()))??;
        log::info!(
            "[PREPROCESS] {} ready in {}ms ({:?})",
            path.display(),
            start.elapsed().as_millis(),
            quality
        );
        Ok(path)
    }
}
