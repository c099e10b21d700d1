//! Events published to the UI boundary.

use crate::llm::{ProblemInfo, SolutionResult};
use serde::Serialize;
use tokio::sync::mpsc;

/// Everything the coordinator tells the outside world.
///
/// Serialized as `{"event": "<name>", "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum PipelineEvent {
    NoCaptures,
    InitialStart,
    ProblemExtracted(ProblemInfo),
    SolutionReady(SolutionResult),
    SolutionError(String),
    DebugStart,
    DebugReady(ProblemInfo),
    DebugError(String),
    CaptureInProgress(bool),
}

impl PipelineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineEvent::NoCaptures => "no-captures",
            PipelineEvent::InitialStart => "initial-start",
            PipelineEvent::ProblemExtracted(_) => "problem-extracted",
            PipelineEvent::SolutionReady(_) => "solution-ready",
            PipelineEvent::SolutionError(_) => "solution-error",
            PipelineEvent::DebugStart => "debug-start",
            PipelineEvent::DebugReady(_) => "debug-ready",
            PipelineEvent::DebugError(_) => "debug-error",
            PipelineEvent::CaptureInProgress(_) => "capture-in-progress",
        }
    }
}

/// Receives coordinator events. Fire-and-forget: implementations must not
/// block, since events are emitted while coordinator state is locked.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

/// Forwards events into an unbounded tokio channel.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<PipelineEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PipelineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: PipelineEvent) {
        let name = event.name();
        if self.tx.send(event).is_err() {
            log::debug!("[PIPELINE] Dropped {} event: no listener", name);
        }
    }
}
