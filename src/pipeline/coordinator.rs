//! Coordinator state and the command surface.
//!
//! All mutable state sits behind one std mutex that is never held across
//! an await. Events that depend on a run are emitted while the lock is
//! held and only after checking the run's token, so once `trigger_reset`
//! or a superseding trigger returns, the old run cannot publish anything.

use super::events::{EventSink, PipelineEvent};
use super::state::{PipelinePhase, RunKind, ViewState};
use super::PipelineConfig;
use crate::capture::{
    Capture, CaptureQueue, CaptureStore, EnqueueOutcome, QueueKind, ScreenCapturer,
};
use crate::error::{CaptureError, PipelineError, StorageError};
use crate::llm::{InferenceClient, ProblemInfo, SolutionResult};
use crate::ocr::TextRecognizer;
use crate::preprocess::ImagePreprocessor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// External services the coordinator drives.
pub struct Collaborators {
    pub store: Arc<dyn CaptureStore>,
    pub recognizer: Arc<dyn TextRecognizer>,
    pub inference: Arc<dyn InferenceClient>,
    pub capturer: Arc<dyn ScreenCapturer>,
    pub sink: Arc<dyn EventSink>,
}

/// One in-flight run. `id` tells it apart from later runs of the same kind.
#[derive(Clone)]
pub(super) struct RunHandle {
    pub id: u64,
    pub kind: RunKind,
    pub token: CancellationToken,
}

pub(super) struct CoordinatorState {
    pub queue: CaptureQueue,
    pub view: ViewState,
    pub phase: PipelinePhase,
    pub problem: Option<ProblemInfo>,
    pub solution: Option<SolutionResult>,
    initial_run: Option<RunHandle>,
    debug_run: Option<RunHandle>,
    next_run_id: u64,
}

impl CoordinatorState {
    fn new(queue: CaptureQueue) -> Self {
        Self {
            queue,
            view: ViewState::Queue,
            phase: PipelinePhase::Idle,
            problem: None,
            solution: None,
            initial_run: None,
            debug_run: None,
            next_run_id: 0,
        }
    }

    fn slot(&mut self, kind: RunKind) -> &mut Option<RunHandle> {
        match kind {
            RunKind::Initial => &mut self.initial_run,
            RunKind::Debug => &mut self.debug_run,
        }
    }

    /// Cancel the previous run of `kind` and register a new one.
    fn begin_run(&mut self, kind: RunKind) -> RunHandle {
        if let Some(previous) = self.slot(kind).take() {
            log::info!("[PIPELINE] Cancelling {} run #{}", kind, previous.id);
            previous.token.cancel();
        }
        self.next_run_id += 1;
        let run = RunHandle {
            id: self.next_run_id,
            kind,
            token: CancellationToken::new(),
        };
        *self.slot(kind) = Some(run.clone());
        run
    }

    fn cancel_all(&mut self) {
        for kind in [RunKind::Initial, RunKind::Debug] {
            if let Some(run) = self.slot(kind).take() {
                log::info!("[PIPELINE] Cancelling {} run #{}", kind, run.id);
                run.token.cancel();
            }
        }
    }

    /// Phase to fall back to when a run fails.
    pub fn stable_phase(&self) -> PipelinePhase {
        match &self.problem {
            Some(problem) if problem.extra_info.is_some() => PipelinePhase::DebugReady,
            Some(_) => PipelinePhase::SolutionsReady,
            None => PipelinePhase::Idle,
        }
    }

    /// Move to `to` on behalf of a `kind` run, unless the other kind is
    /// currently the one running.
    pub fn transition(&mut self, kind: RunKind, to: PipelinePhase) {
        let other_running = match kind {
            RunKind::Initial => PipelinePhase::DebugRunning,
            RunKind::Debug => PipelinePhase::InitialRunning,
        };
        if self.phase != other_running {
            self.phase = to;
        }
    }
}

pub struct Coordinator {
    pub(super) store: Arc<dyn CaptureStore>,
    pub(super) recognizer: Arc<dyn TextRecognizer>,
    pub(super) inference: Arc<dyn InferenceClient>,
    pub(super) preprocessor: ImagePreprocessor,
    pub(super) config: PipelineConfig,
    capturer: Arc<dyn ScreenCapturer>,
    sink: Arc<dyn EventSink>,
    state: Mutex<CoordinatorState>,
}

impl Coordinator {
    pub fn new(
        collaborators: Collaborators,
        preprocessor: ImagePreprocessor,
        config: PipelineConfig,
    ) -> Arc<Self> {
        let Collaborators {
            store,
            recognizer,
            inference,
            capturer,
            sink,
        } = collaborators;
        log::info!(
            "[PIPELINE] Coordinator ready (inference: {}, language: {})",
            inference.name(),
            config.solution_language
        );
        Arc::new(Self {
            state: Mutex::new(CoordinatorState::new(CaptureQueue::new(Arc::clone(&store)))),
            store,
            recognizer,
            inference,
            preprocessor,
            config,
            capturer,
            sink,
        })
    }

    pub(super) fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, event: PipelineEvent) {
        log::debug!("[PIPELINE] -> {}", event.name());
        self.sink.emit(event);
    }

    // ── Commands ────────────────────────────────────────────────────────

    /// Take a screenshot and queue it according to the current view.
    ///
    /// Wrapped in `capture-in-progress` true/false events.
    pub async fn trigger_capture(&self) -> Result<Capture, CaptureError> {
        self.emit(PipelineEvent::CaptureInProgress(true));
        let result = self.capture_and_enqueue().await;
        self.emit(PipelineEvent::CaptureInProgress(false));
        if let Err(e) = &result {
            log::error!("[CAPTURE] Capture failed: {}", e);
        }
        result
    }

    async fn capture_and_enqueue(&self) -> Result<Capture, CaptureError> {
        let start = Instant::now();
        let capturer = Arc::clone(&self.capturer);
        let png = tokio::task::spawn_blocking(move || capturer.capture_full_screen())
            .await
            .map_err(|e| CaptureError::Tool(format!("capture task failed: {}", e)))??;

        let kind = self.view().capture_target();
        let path = self.store.write_capture(kind, &png)?;
        let (capture, outcome) = self.enqueue_capture(path);
        log::info!(
            "[CAPTURE] Screenshot taken in {}ms ({:?})",
            start.elapsed().as_millis(),
            outcome
        );
        Ok(capture)
    }

    /// Queue an image that is already on disk.
    pub fn enqueue_capture(&self, path: impl Into<PathBuf>) -> (Capture, EnqueueOutcome) {
        // Preview decoding happens before taking the lock.
        let capture = Capture::from_path(path);
        let mut state = self.lock();
        let view = state.view;
        let outcome = state.queue.enqueue(capture.clone(), view);
        (capture, outcome)
    }

    /// Run whatever pipeline the current view calls for.
    ///
    /// `queue` view starts an initial run. In `solutions`/`debug` view a
    /// non-empty secondary queue starts a debug run, otherwise the problem
    /// is regenerated from the primary queue.
    pub fn trigger_process(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let (view, has_secondary) = {
            let state = self.lock();
            (state.view, !state.queue.is_empty(QueueKind::Secondary))
        };
        match view {
            ViewState::Queue => self.start_initial(false),
            _ if has_secondary => self.trigger_debug(),
            _ => self.trigger_regenerate(),
        }
    }

    /// Discard the current results and re-run the initial pipeline.
    pub fn trigger_regenerate(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        self.start_initial(true)
    }

    /// Analyse the secondary queue against the current problem.
    pub fn trigger_debug(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let (run, captures) = {
            let mut state = self.lock();
            let captures = state.queue.list(QueueKind::Secondary);
            if captures.is_empty() {
                log::info!("[DEBUG] Debug requested with an empty secondary queue");
                self.emit(PipelineEvent::NoCaptures);
                return None;
            }
            if state.problem.is_none() {
                log::warn!("[DEBUG] Debug requested before a problem was extracted");
                self.emit(PipelineEvent::DebugError(
                    "No problem to debug yet. Process a capture first.".to_string(),
                ));
                return None;
            }
            let run = state.begin_run(RunKind::Debug);
            state.queue.hold(run.id, &captures);
            state.transition(RunKind::Debug, PipelinePhase::DebugRunning);
            self.emit(PipelineEvent::DebugStart);
            (run, captures)
        };

        log::info!(
            "[DEBUG] Run #{} started with {} capture(s)",
            run.id,
            captures.len()
        );
        let this = Arc::clone(self);
        Some(tokio::spawn(async move {
            let start = Instant::now();
            let result = this.run_debug(&run, captures).await;
            this.settle(&run, result, start);
        }))
    }

    fn start_initial(self: &Arc<Self>, discard_results: bool) -> Option<JoinHandle<()>> {
        let (run, captures) = {
            let mut state = self.lock();
            let captures = state.queue.list(QueueKind::Primary);
            if captures.is_empty() {
                log::info!("[PIPELINE] Process requested with an empty primary queue");
                self.emit(PipelineEvent::NoCaptures);
                return None;
            }
            let run = state.begin_run(RunKind::Initial);
            state.queue.hold(run.id, &captures);
            if discard_results {
                state.problem = None;
                state.solution = None;
            }
            state.phase = PipelinePhase::InitialRunning;
            self.emit(PipelineEvent::InitialStart);
            (run, captures)
        };

        log::info!(
            "[PIPELINE] Initial run #{} started with {} capture(s)",
            run.id,
            captures.len()
        );
        let this = Arc::clone(self);
        Some(tokio::spawn(async move {
            let start = Instant::now();
            let result = this.run_initial(&run, captures).await;
            this.settle(&run, result, start);
        }))
    }

    /// Cancel everything, empty both queues and drop all results.
    pub fn trigger_reset(&self) {
        let mut state = self.lock();
        state.cancel_all();
        state.queue.clear_all();
        state.problem = None;
        state.solution = None;
        state.view = ViewState::Queue;
        state.phase = PipelinePhase::Idle;
        log::info!("[PIPELINE] Reset complete");
    }

    /// Delete one capture by id (its path). The capture stays queued if the
    /// file cannot be deleted. A file a running pipeline is reading is
    /// deleted once that run settles.
    pub fn delete_capture(&self, id: &str) -> Result<(), StorageError> {
        let removed = self.lock().queue.remove(Path::new(id))?;
        log::info!("[QUEUE] Deleted capture {}", removed.id());
        Ok(())
    }

    pub fn list_captures(&self, kind: QueueKind) -> Vec<Capture> {
        self.lock().queue.list(kind)
    }

    // ── State inspection ────────────────────────────────────────────────

    pub fn view(&self) -> ViewState {
        self.lock().view
    }

    pub fn phase(&self) -> PipelinePhase {
        self.lock().phase
    }

    pub fn problem(&self) -> Option<ProblemInfo> {
        self.lock().problem.clone()
    }

    pub fn solution(&self) -> Option<SolutionResult> {
        self.lock().solution.clone()
    }

    // ── Run bookkeeping ─────────────────────────────────────────────────

    /// Stop here if the run has been superseded or reset.
    pub(super) fn checkpoint(&self, run: &RunHandle) -> Result<(), PipelineError> {
        if run.token.is_cancelled() {
            return Err(PipelineError::Superseded);
        }
        Ok(())
    }

    /// Apply a state change and emit its event, atomically with respect to
    /// cancellation.
    pub(super) fn publish<F>(&self, run: &RunHandle, apply: F) -> Result<(), PipelineError>
    where
        F: FnOnce(&mut CoordinatorState) -> Result<PipelineEvent, PipelineError>,
    {
        let mut state = self.lock();
        if run.token.is_cancelled() {
            return Err(PipelineError::Superseded);
        }
        let event = apply(&mut state)?;
        self.emit(event);
        Ok(())
    }

    fn settle(&self, run: &RunHandle, result: Result<(), PipelineError>, start: Instant) {
        let elapsed = start.elapsed().as_millis();
        match result {
            Ok(()) => log::info!(
                "[PIPELINE] {} run #{} complete in {}ms",
                run.kind,
                run.id,
                elapsed
            ),
            Err(e) if e.is_silent() => log::info!(
                "[PIPELINE] {} run #{} stopped after {}ms: {}",
                run.kind,
                run.id,
                elapsed,
                e
            ),
            Err(e) => self.fail(run, e),
        }

        let mut state = self.lock();
        state.queue.release(run.id);
        let slot = state.slot(run.kind);
        if slot.as_ref().map(|r| r.id) == Some(run.id) {
            *slot = None;
        }
    }

    fn fail(&self, run: &RunHandle, error: PipelineError) {
        let mut state = self.lock();
        if run.token.is_cancelled() {
            log::info!(
                "[PIPELINE] {} run #{} failed after cancellation: {}",
                run.kind,
                run.id,
                error
            );
            return;
        }
        log::error!("[PIPELINE] {} run #{} failed: {}", run.kind, run.id, error);

        let fallback = state.stable_phase();
        state.transition(run.kind, fallback);
        let message = error.to_string();
        match run.kind {
            RunKind::Initial => {
                if state.problem.is_none() {
                    state.view = ViewState::Queue;
                }
                self.emit(PipelineEvent::SolutionError(message));
            }
            RunKind::Debug => self.emit(PipelineEvent::DebugError(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::FsCaptureStore;

    fn state() -> CoordinatorState {
        let dir = std::env::temp_dir();
        CoordinatorState::new(CaptureQueue::new(Arc::new(FsCaptureStore::new(&dir, &dir))))
    }

    #[test]
    fn begin_run_cancels_the_previous_run_of_that_kind_only() {
        let mut state = state();
        let first = state.begin_run(RunKind::Initial);
        let debug = state.begin_run(RunKind::Debug);
        let second = state.begin_run(RunKind::Initial);

        assert!(first.token.is_cancelled());
        assert!(!second.token.is_cancelled());
        assert!(!debug.token.is_cancelled());
        assert!(second.id > first.id);

        state.cancel_all();
        assert!(second.token.is_cancelled());
        assert!(debug.token.is_cancelled());
    }

    #[test]
    fn stable_phase_follows_results() {
        let mut state = state();
        assert_eq!(state.stable_phase(), PipelinePhase::Idle);
        state.problem = Some(ProblemInfo::default());
        assert_eq!(state.stable_phase(), PipelinePhase::SolutionsReady);
        state.problem = Some(ProblemInfo {
            extra_info: Some("Screenshot 1:\nok".to_string()),
            ..Default::default()
        });
        assert_eq!(state.stable_phase(), PipelinePhase::DebugReady);
    }

    #[test]
    fn transition_leaves_the_other_running_kind_alone() {
        let mut state = state();
        state.phase = PipelinePhase::DebugRunning;
        state.transition(RunKind::Initial, PipelinePhase::SolutionsReady);
        assert_eq!(state.phase, PipelinePhase::DebugRunning);
        state.transition(RunKind::Debug, PipelinePhase::DebugReady);
        assert_eq!(state.phase, PipelinePhase::DebugReady);
    }
}
