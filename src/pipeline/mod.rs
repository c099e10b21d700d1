//! Pipeline domain — the coordinator that drives capture analysis.
//!
//! Two pipelines share one [`Coordinator`]:
//! - initial: primary captures → normalize → OCR → infer(image) → interpret
//!   → publish ProblemInfo → infer(solution prompt) → publish SolutionResult
//! - debug: secondary captures → normalize → infer(image) → merge into
//!   the current ProblemInfo's extra info
//!
//! Each kind has at most one run in flight. Starting a run cancels the
//! previous run of the same kind; a cancelled run stops without events.
//!
//! Files:
//!   - coordinator.rs — shared state, commands, run bookkeeping
//!   - runs.rs        — the two pipeline bodies
//!   - events.rs      — events for the UI boundary
//!   - state.rs       — view / phase enums

mod coordinator;
mod events;
mod runs;
mod state;

pub use coordinator::{Collaborators, Coordinator};
pub use events::{ChannelSink, EventSink, PipelineEvent};
pub use state::{PipelinePhase, RunKind, ViewState};

use std::time::Duration;

/// Per-call timeouts and solution settings for pipeline runs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Image → problem extraction call.
    pub extract_timeout: Duration,
    /// Problem → solution generation call.
    pub solution_timeout: Duration,
    /// Per-capture debug analysis call.
    pub debug_timeout: Duration,
    /// Language requested for generated solutions.
    pub solution_language: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extract_timeout: Duration::from_secs(90),
            solution_timeout: Duration::from_secs(180),
            debug_timeout: Duration::from_secs(90),
            solution_language: "python".to_string(),
        }
    }
}
