//! Gemini Flash client via the Google AI generateContent API.
//!
//! Key differences from Anthropic:
//! - API key in URL query param, not header
//! - Images go in `inline_data` parts
//! - Text comes back in `candidates[0].content.parts[*].text`

use super::prompts::GEMINI_MODEL;
use super::{api_key_from_env, bounded, excerpt, InferenceClient, InferencePayload, InferenceRequest};
use crate::error::InferenceError;
use base64::Engine;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const ENV_KEY: &str = "GEMINI_API_KEY";

pub struct GeminiClient {
    http: reqwest::Client,
    model: String,
}

impl GeminiClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            model: GEMINI_MODEL.to_string(),
        }
    }

    fn build_body(&self, request: &InferenceRequest) -> serde_json::Value {
        let part = match &request.payload {
            InferencePayload::Text(prompt) => serde_json::json!({ "text": prompt }),
            InferencePayload::Image { png } => serde_json::json!({
                "inline_data": {
                    "mime_type": "image/png",
                    "data": base64::engine::general_purpose::STANDARD.encode(png),
                }
            }),
        };
        serde_json::json!({
            "contents": [{ "role": "user", "parts": [part] }],
            "systemInstruction": {
                "parts": [{ "text": request.purpose.system_prompt() }]
            },
            "generationConfig": {
                "maxOutputTokens": request.purpose.max_tokens(),
                "temperature": 0.2
            }
        })
    }

    async fn send(&self, api_key: &str, body: serde_json::Value) -> Result<String, InferenceError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, api_key
        );
        let resp = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                log::error!("[LLM] HTTP request failed: {}", e);
                InferenceError::Backend(format!("API request failed: {}", e))
            })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| InferenceError::Backend(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            log::error!("[LLM] Gemini API returned {}: {}", status, excerpt(&text, 200));
            return Err(InferenceError::Backend(format!("API error ({})", status)));
        }

        extract_gemini_text(&text)
            .ok_or_else(|| InferenceError::Backend("No text in response".to_string()))
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl InferenceClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn infer(
        &self,
        request: &InferenceRequest,
        cancel: &CancellationToken,
        timeout: Duration,
    ) -> Result<String, InferenceError> {
        let api_key = api_key_from_env(ENV_KEY)?;
        let body = self.build_body(request);

        log::info!("[LLM] Provider: gemini, model: {}, purpose: {:?}", self.model, request.purpose);
        let start = std::time::Instant::now();
        let text = bounded(cancel, timeout, self.send(&api_key, body)).await?;
        log::info!(
            "[LLM] Response in {}ms ({} chars)",
            start.elapsed().as_millis(),
            text.len()
        );
        Ok(text)
    }
}

/// Extract text content from a Gemini response.
fn extract_gemini_text(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    let parts = json
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
