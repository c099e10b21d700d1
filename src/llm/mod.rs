//! LLM domain — inference clients for the analysis pipeline.
//!
//! Public API for the model layer. The pipeline only talks to
//! [`InferenceClient`]; providers live in their own files:
//!   - anthropic.rs — Anthropic Messages API
//!   - gemini.rs    — Google Gemini generateContent
//!
//! Shared:
//!   - prompts.rs   — system prompts + message builders
//!   - provider.rs  — provider metadata + configuration checks
//!   - types.rs     — ProblemInfo / SolutionResult

mod anthropic;
mod gemini;
pub mod prompts;
pub mod provider;
pub mod types;

pub use anthropic::AnthropicClient;
pub use gemini::GeminiClient;
pub use types::{ProblemExample, ProblemInfo, SolutionResult};

use crate::error::InferenceError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// What an inference call is for. Selects the system prompt and token budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferencePurpose {
    ExtractProblem,
    GenerateSolution,
    DebugAnalysis,
}

impl InferencePurpose {
    pub fn system_prompt(self) -> &'static str {
        match self {
            InferencePurpose::ExtractProblem => prompts::EXTRACT_SYSTEM_PROMPT,
            InferencePurpose::GenerateSolution => prompts::SOLUTION_SYSTEM_PROMPT,
            InferencePurpose::DebugAnalysis => prompts::DEBUG_SYSTEM_PROMPT,
        }
    }

    pub fn max_tokens(self) -> u32 {
        match self {
            InferencePurpose::ExtractProblem => prompts::EXTRACT_MAX_TOKENS,
            InferencePurpose::GenerateSolution => prompts::SOLUTION_MAX_TOKENS,
            InferencePurpose::DebugAnalysis => prompts::DEBUG_MAX_TOKENS,
        }
    }
}

/// A text prompt, or an image the model analyses on its own.
#[derive(Debug, Clone)]
pub enum InferencePayload {
    Text(String),
    Image { png: Vec<u8> },
}

#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub purpose: InferencePurpose,
    pub payload: InferencePayload,
}

impl InferenceRequest {
    pub fn text(purpose: InferencePurpose, prompt: impl Into<String>) -> Self {
        Self {
            purpose,
            payload: InferencePayload::Text(prompt.into()),
        }
    }

    pub fn image(purpose: InferencePurpose, png: Vec<u8>) -> Self {
        Self {
            purpose,
            payload: InferencePayload::Image { png },
        }
    }
}

/// Sends a request to a generative backend and returns its raw text.
///
/// Implementations must abort with [`InferenceError::Cancelled`] when
/// `cancel` fires and with [`InferenceError::Timeout`] after `timeout`,
/// independent of the backend.
#[async_trait::async_trait]
pub trait InferenceClient: Send + Sync {
    fn name(&self) -> &str;

    async fn infer(
        &self,
        request: &InferenceRequest,
        cancel: &CancellationToken,
        timeout: Duration,
    ) -> Result<String, InferenceError>;
}

/// Race `fut` against cancellation and a local timeout.
pub async fn bounded<T, F>(
    cancel: &CancellationToken,
    timeout: Duration,
    fut: F,
) -> Result<T, InferenceError>
where
    F: Future<Output = Result<T, InferenceError>>,
{
    if cancel.is_cancelled() {
        return Err(InferenceError::Cancelled);
    }
    tokio::select! {
        biased;

        // Cancellation takes priority
        _ = cancel.cancelled() => {
            log::info!("[LLM] Request cancelled");
            Err(InferenceError::Cancelled)
        }

        _ = tokio::time::sleep(timeout) => {
            log::warn!("[LLM] Request timed out after {:?}", timeout);
            Err(InferenceError::Timeout(timeout))
        }

        result = fut => result,
    }
}

/// Build the client for a provider id ("anthropic" | "gemini").
///
/// Unknown ids fall back to Anthropic. API keys are read at call time, so a
/// missing key surfaces as `NotConfigured` on the first request.
pub fn client_for_provider(provider_id: &str) -> Arc<dyn InferenceClient> {
    match provider_id {
        "gemini" => Arc::new(GeminiClient::new()),
        _ => Arc::new(AnthropicClient::new()),
    }
}

/// Read an API key from the environment, treating empty values as unset.
fn api_key_from_env(env_key: &str) -> Result<String, InferenceError> {
    match std::env::var(env_key) {
        Ok(key) if !key.is_empty() => Ok(key),
        _ => Err(InferenceError::NotConfigured(env_key.to_string())),
    }
}

/// Truncate a body for logs and error messages.
fn excerpt(body: &str, max: usize) -> &str {
    match body.char_indices().nth(max) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
