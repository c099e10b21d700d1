//! View and phase state for the coordinator.

use crate::capture::QueueKind;
use serde::{Deserialize, Serialize};

/// What the UI is showing. Decides where new captures go and what a
/// process trigger does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewState {
    #[default]
    Queue,
    Solutions,
    Debug,
}

impl ViewState {
    /// Queue that receives captures taken in this view.
    pub fn capture_target(self) -> QueueKind {
        match self {
            ViewState::Queue => QueueKind::Primary,
            ViewState::Solutions | ViewState::Debug => QueueKind::Secondary,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelinePhase {
    #[default]
    Idle,
    InitialRunning,
    SolutionsReady,
    DebugRunning,
    DebugReady,
}

impl PipelinePhase {
    pub fn is_running(self) -> bool {
        matches!(self, PipelinePhase::InitialRunning | PipelinePhase::DebugRunning)
    }
}

/// The two independent cancellation domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Initial,
    Debug,
}

impl std::fmt::Display for RunKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunKind::Initial => f.write_str("initial"),
            RunKind::Debug => f.write_str("debug"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_queue_view_targets_primary() {
        assert_eq!(ViewState::Queue.capture_target(), QueueKind::Primary);
        assert_eq!(ViewState::Solutions.capture_target(), QueueKind::Secondary);
        assert_eq!(ViewState::Debug.capture_target(), QueueKind::Secondary);
    }

    #[test]
    fn phases_serialize_kebab_case() {
        let json = serde_json::to_string(&PipelinePhase::InitialRunning).unwrap();
        assert_eq!(json, "\"initial-running\"");
        assert!(!PipelinePhase::SolutionsReady.is_running());
        assert!(PipelinePhase::DebugRunning.is_running());
    }
}
