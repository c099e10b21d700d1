//! Persistent settings and provider resolution.
//!
//! Settings live in `~/.config/snapsolve/settings.json` (platform config
//! dir). Environment variables override the file:
//! - `LLM_PROVIDER`      — "anthropic" | "gemini"
//! - `OCR_MODE`          — "fast" | "accurate"
//! - `SOLUTION_LANGUAGE` — language requested for solutions
//!
//! API keys are never written to the settings file. They come from the
//! environment or the OS keychain (keyring crate).

use crate::error::SettingsError;
use crate::llm::provider::{all_providers, env_key_for};
use crate::ocr::RecognitionLevel;
use crate::pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "snapsolve";
const KEYRING_SERVICE: &str = "snapsolve";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Explicit provider; `None` picks the first one with a key.
    pub provider: Option<String>,
    pub ocr_mode: String,
    pub solution_language: String,
    pub recognition_timeout_secs: u64,
    pub extract_timeout_secs: u64,
    pub solution_timeout_secs: u64,
    pub debug_timeout_secs: u64,
    /// Root for capture files. Defaults to the platform data dir.
    pub capture_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: None,
            ocr_mode: "fast".to_string(),
            solution_language: "python".to_string(),
            recognition_timeout_secs: 60,
            extract_timeout_secs: 90,
            solution_timeout_secs: 180,
            debug_timeout_secs: 90,
            capture_dir: None,
        }
    }
}

impl Settings {
    pub fn path() -> Result<PathBuf, SettingsError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join("settings.json"))
            .ok_or(SettingsError::NoConfigDir)
    }

    /// Load from the default location, then apply env overrides.
    pub fn load() -> Self {
        let settings = match Self::path() {
            Ok(path) => Self::load_from(&path),
            Err(e) => {
                log::warn!("[SETTINGS] {} — using defaults", e);
                Self::default()
            }
        };
        settings.with_overrides(|key| std::env::var(key).ok())
    }

    /// Read a settings file. Missing or invalid files yield defaults.
    pub fn load_from(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            log::warn!("[SETTINGS] Ignoring invalid {}: {}", path.display(), e);
            Self::default()
        })
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        self.save_to(&Self::path()?)
    }

    /// Write settings as pretty JSON. An unknown explicit provider is rejected.
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(provider) = &self.provider {
            if env_key_for(provider).is_none() {
                return Err(SettingsError::UnknownProvider(provider.clone()));
            }
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("[SETTINGS] Saved {}", path.display());
        Ok(())
    }

    /// Apply `LLM_PROVIDER` / `OCR_MODE` / `SOLUTION_LANGUAGE` from `lookup`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(provider) = non_empty("LLM_PROVIDER") {
            self.provider = Some(provider.trim().to_lowercase());
        }
        if let Some(mode) = non_empty("OCR_MODE") {
            self.ocr_mode = mode.trim().to_lowercase();
        }
        if let Some(language) = non_empty("SOLUTION_LANGUAGE") {
            self.solution_language = language.trim().to_string();
        }
        self
    }

    pub fn recognition_level(&self) -> RecognitionLevel {
        RecognitionLevel::from_mode(&self.ocr_mode)
    }

    pub fn recognition_timeout(&self) -> Duration {
        Duration::from_secs(self.recognition_timeout_secs)
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            extract_timeout: Duration::from_secs(self.extract_timeout_secs),
            solution_timeout: Duration::from_secs(self.solution_timeout_secs),
            debug_timeout: Duration::from_secs(self.debug_timeout_secs),
            solution_language: self.solution_language.clone(),
        }
    }

    /// Primary and secondary capture directories.
    pub fn capture_dirs(&self) -> (PathBuf, PathBuf) {
        let root = self.capture_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(APP_DIR)
                .join("captures")
        });
        (root.join("primary"), root.join("secondary"))
    }
}

// ── Provider resolution ──────────────────────────────────────────────

/// Determine which inference provider to use.
///
/// Priority:
/// 1. Explicit provider from settings / `LLM_PROVIDER`
/// 2. First provider with an API key set (env var or keychain)
/// 3. "anthropic" as final default
pub fn resolve_provider(settings: &Settings) -> String {
    if let Some(p) = &settings.provider {
        if env_key_for(p).is_some() {
            log::info!("[SETTINGS] Provider override: {}", p);
            return p.clone();
        }
        log::warn!("[SETTINGS] Unknown provider '{}' — auto-detecting", p);
    }

    for provider in all_providers() {
        if has_api_key(&provider.id) {
            return provider.id;
        }
    }

    // Requests will fail with NotConfigured until a key is added.
    "anthropic".to_string()
}

/// Check env then OS keychain for a provider key. A keychain hit is loaded
/// into the environment so the clients can read it.
fn has_api_key(provider_id: &str) -> bool {
    let Some(env_key) = env_key_for(provider_id) else {
        return false;
    };

    if std::env::var(env_key).map(|k| !k.is_empty()).unwrap_or(false) {
        return true;
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, provider_id) {
        if let Ok(key) = entry.get_password() {
            if !key.is_empty() {
                std::env::set_var(env_key, &key);
                log::info!("[SETTINGS] Loaded {} key from OS keychain", provider_id);
                return true;
            }
        }
    }

    false
}

/// Store an API key in the OS keychain and the current environment.
pub fn save_api_key(provider_id: &str, api_key: &str) -> Result<(), SettingsError> {
    let env_key = env_key_for(provider_id)
        .ok_or_else(|| SettingsError::UnknownProvider(provider_id.to_string()))?;

    let entry = keyring::Entry::new(KEYRING_SERVICE, provider_id)
        .map_err(|e| SettingsError::Keyring(e.to_string()))?;
    entry
        .set_password(api_key)
        .map_err(|e| SettingsError::Keyring(e.to_string()))?;

    std::env::set_var(env_key, api_key);
    log::info!("[SETTINGS] API key saved for provider: {}", provider_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_pipeline_timeouts() {
        let config = Settings::default().pipeline_config();
        assert_eq!(config.extract_timeout, Duration::from_secs(90));
        assert_eq!(config.solution_timeout, Duration::from_secs(180));
        assert_eq!(config.debug_timeout, Duration::from_secs(90));
        assert_eq!(config.solution_language, "python");
        assert_eq!(Settings::default().recognition_level(), RecognitionLevel::Fast);
    }

    #[test]
    fn overrides_win_over_file_values() {
        let env: HashMap<&str, &str> = [
            ("LLM_PROVIDER", " Gemini "),
            ("OCR_MODE", "ACCURATE"),
            ("SOLUTION_LANGUAGE", ""),
        ]
        .into_iter()
        .collect();
        let settings = Settings::default().with_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(settings.provider.as_deref(), Some("gemini"));
        assert_eq!(settings.recognition_level(), RecognitionLevel::Accurate);
        assert_eq!(settings.solution_language, "python");
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            solution_language: "rust".to_string(),
            capture_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);

        let (primary, secondary) = settings.capture_dirs();
        assert_eq!(primary, dir.path().join("primary"));
        assert_eq!(secondary, dir.path().join("secondary"));
    }

    #[test]
    fn save_rejects_unknown_provider() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            provider: Some("local".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            settings.save_to(&path),
            Err(SettingsError::UnknownProvider(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn missing_or_invalid_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Settings::load_from(&dir.path().join("absent.json")), Settings::default());

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&bad), Settings::default());

        let partial = dir.path().join("partial.json");
        std::fs::write(&partial, r#"{"solutionLanguage": "go"}"#).unwrap();
        let loaded = Settings::load_from(&partial);
        assert_eq!(loaded.solution_language, "go");
        assert_eq!(loaded.solution_timeout_secs, 180);
    }

    #[test]
    fn explicit_known_provider_is_used() {
        let settings = Settings {
            provider: Some("gemini".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_provider(&settings), "gemini");
    }

    #[test]
    fn unknown_provider_cannot_store_keys() {
        assert!(matches!(
            save_api_key("local", "k"),
            Err(SettingsError::UnknownProvider(_))
        ));
    }
}
