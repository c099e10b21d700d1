//! Inference provider metadata and configuration checks.

use serde::{Deserialize, Serialize};

/// Provider metadata exposed to the settings boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub env_key: String,
    pub model: String,
    pub supports_images: bool,
}

/// All known providers and their display info.
pub fn all_providers() -> Vec<ProviderInfo> {
    vec![
        ProviderInfo {
            id: "anthropic".to_string(),
            name: "Claude Haiku".to_string(),
            env_key: "ANTHROPIC_API_KEY".to_string(),
            model: super::prompts::MODEL.to_string(),
            supports_images: true,
        },
        ProviderInfo {
            id: "gemini".to_string(),
            name: "Gemini Flash".to_string(),
            env_key: "GEMINI_API_KEY".to_string(),
            model: super::prompts::GEMINI_MODEL.to_string(),
            supports_images: true,
        },
    ]
}

/// Environment variable holding a provider's API key.
pub fn env_key_for(provider_id: &str) -> Option<&'static str> {
    match provider_id {
        "anthropic" => Some("ANTHROPIC_API_KEY"),
        "gemini" => Some("GEMINI_API_KEY"),
        _ => None,
    }
}

/// Check if a provider has an API key in the environment.
pub fn is_provider_configured(provider_id: &str) -> bool {
    env_key_for(provider_id)
        .and_then(|key| std::env::var(key).ok())
        .map(|k| !k.is_empty())
        .unwrap_or(false)
}
