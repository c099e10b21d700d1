//! Anthropic Messages API client (non-streaming).

use super::prompts::MODEL;
use super::{api_key_from_env, bounded, excerpt, InferenceClient, InferencePayload, InferenceRequest};
use crate::error::InferenceError;
use base64::Engine;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const ENV_KEY: &str = "ANTHROPIC_API_KEY";

pub struct AnthropicClient {
    http: reqwest::Client,
    model: String,
}

impl AnthropicClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            model: MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn build_body(&self, request: &InferenceRequest) -> serde_json::Value {
        let content = match &request.payload {
            InferencePayload::Text(prompt) => serde_json::json!(prompt),
            InferencePayload::Image { png } => serde_json::json!([
                {
                    "type": "image",
                    "source": {
                        "type": "base64",
                        "media_type": "image/png",
                        "data": base64::engine::general_purpose::STANDARD.encode(png),
                    }
                }
            ]),
        };
        serde_json::json!({
            "model": self.model,
            "max_tokens": request.purpose.max_tokens(),
            "system": request.purpose.system_prompt(),
            "messages": [{"role": "user", "content": content}]
        })
    }

    async fn send(&self, api_key: &str, body: serde_json::Value) -> Result<String, InferenceError> {
        let resp = self
            .http
            .post(ENDPOINT)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
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
            log::error!("[LLM] API returned {}: {}", status, excerpt(&text, 200));
            return Err(InferenceError::Backend(format!("API error ({})", status)));
        }

        extract_anthropic_text(&text)
            .ok_or_else(|| InferenceError::Backend("No text in response".to_string()))
    }
}

impl Default for AnthropicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl InferenceClient for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn infer(
        &self,
        request: &InferenceRequest,
        cancel: &CancellationToken,
        timeout: Duration,
    ) -> Result<String, InferenceError> {
        let api_key = api_key_from_env(ENV_KEY)?;
        let body = self.build_body(request);

        log::info!("[LLM] Provider: anthropic, model: {}, purpose: {:?}", self.model, request.purpose);
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

/// Concatenate the text blocks of an Anthropic Messages API response.
fn extract_anthropic_text(body: &str) -> Option<String> {
    let parsed: serde_json::Value = serde_json::from_str(body).ok()?;
    let content = parsed.get("content")?.as_array()?;
    let texts: Vec<&str> = content
        .iter()
        .filter(|block| block.get("type").and_then(|t| t.as_str()) == Some("text"))
        .filter_map(|block| block.get("text").and_then(|t| t.as_str()))
        .collect();
    if texts.is_empty() {
        None
    } else {
        Some(texts.join(""))
    }
}
