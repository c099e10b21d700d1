//! Command handlers for the UI boundary.
//!
//! Thin wrappers: each command maps to one coordinator or settings call
//! and returns JSON. Errors become strings for the caller to display.
//! Pipeline triggers return immediately; progress arrives as events.

use crate::capture::{EnqueueOutcome, QueueKind};
use crate::llm::provider::{all_providers, is_provider_configured};
use crate::pipeline::Coordinator;
use crate::settings::{self, Settings};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

/// A request from the boundary, e.g. `{"command": "list_captures", "kind": "primary"}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    TriggerCapture,
    /// Queue an existing image file instead of taking a screenshot.
    EnqueueCapture { path: PathBuf },
    TriggerProcess,
    TriggerDebug,
    TriggerRegenerate,
    TriggerReset,
    DeleteCapture { id: String },
    ListCaptures { kind: QueueKind },
    GetState,
    GetProviderConfig,
    SaveApiKey { provider_id: String, api_key: String },
    GetSettings,
    /// Persist settings. Takes effect on the next start.
    SaveSettings { settings: Settings },
}

pub async fn dispatch(coordinator: &Arc<Coordinator>, command: Command) -> Result<Value, String> {
    match command {
        Command::TriggerCapture => {
            let capture = coordinator
                .trigger_capture()
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!(capture))
        }
        Command::EnqueueCapture { path } => {
            if !path.is_file() {
                return Err(format!("No image at {}", path.display()));
            }
            let (capture, outcome) = coordinator.enqueue_capture(path);
            let evicted = match &outcome {
                EnqueueOutcome::AddedWithEviction { evicted } => Some(evicted.id()),
                _ => None,
            };
            Ok(json!({
                "capture": capture,
                "duplicate": outcome == EnqueueOutcome::Duplicate,
                "evicted": evicted,
            }))
        }
        Command::TriggerProcess => Ok(started(coordinator.trigger_process().is_some())),
        Command::TriggerDebug => Ok(started(coordinator.trigger_debug().is_some())),
        Command::TriggerRegenerate => Ok(started(coordinator.trigger_regenerate().is_some())),
        Command::TriggerReset => {
            coordinator.trigger_reset();
            Ok(Value::Null)
        }
        Command::DeleteCapture { id } => {
            coordinator.delete_capture(&id).map_err(|e| e.to_string())?;
            Ok(Value::Null)
        }
        Command::ListCaptures { kind } => Ok(json!(coordinator.list_captures(kind))),
        Command::GetState => Ok(json!({
            "view": coordinator.view(),
            "phase": coordinator.phase(),
            "problem": coordinator.problem(),
            "solution": coordinator.solution(),
            "primaryCount": coordinator.list_captures(QueueKind::Primary).len(),
            "secondaryCount": coordinator.list_captures(QueueKind::Secondary).len(),
        })),
        Command::GetProviderConfig => {
            let providers = all_providers();
            let active = settings::resolve_provider(&Settings::load());
            let configured: Vec<String> = providers
                .iter()
                .filter(|p| is_provider_configured(&p.id))
                .map(|p| p.id.clone())
                .collect();
            Ok(json!({
                "activeProvider": active,
                "providers": providers,
                "configuredProviders": configured,
            }))
        }
        Command::SaveApiKey {
            provider_id,
            api_key,
        } => {
            settings::save_api_key(&provider_id, &api_key).map_err(|e| e.to_string())?;
            Ok(Value::Null)
        }
        Command::GetSettings => Ok(json!(Settings::load())),
        Command::SaveSettings { settings } => {
            settings.save().map_err(|e| e.to_string())?;
            Ok(Value::Null)
        }
    }
}

fn started(started: bool) -> Value {
    json!({ "started": started })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_commands() {
        let cmd: Command =
            serde_json::from_str(r#"{"command": "list_captures", "kind": "secondary"}"#).unwrap();
        assert_eq!(cmd, Command::ListCaptures { kind: QueueKind::Secondary });

        let cmd: Command = serde_json::from_str(r#"{"command": "trigger_process"}"#).unwrap();
        assert_eq!(cmd, Command::TriggerProcess);

        let cmd: Command =
            serde_json::from_str(r#"{"command": "delete_capture", "id": "/tmp/a.png"}"#).unwrap();
        assert_eq!(cmd, Command::DeleteCapture { id: "/tmp/a.png".to_string() });
    }

    #[test]
    fn save_settings_takes_a_partial_camel_case_object() {
        let cmd: Command = serde_json::from_str(
            r#"{"command": "save_settings", "settings": {"provider": "gemini", "solutionLanguage": "rust"}}"#,
        )
        .unwrap();
        let Command::SaveSettings { settings } = cmd else {
            panic!("expected SaveSettings");
        };
        assert_eq!(settings.provider.as_deref(), Some("gemini"));
        assert_eq!(settings.solution_language, "rust");
        assert_eq!(settings.extract_timeout_secs, Settings::default().extract_timeout_secs);
    }

    #[test]
    fn rejects_unknown_commands() {
        assert!(serde_json::from_str::<Command>(r#"{"command": "format_disk"}"#).is_err());
        assert!(serde_json::from_str::<Command>(r#"{"command": "list_captures"}"#).is_err());
    }
}
