//! Live test against the Anthropic API.
//!
//! Sends a solution request for a small problem and checks that the reply
//! interprets into real code rather than the raw-text fallback.
//!
//! Loads the API key from .env.local using dotenvy, same as the app.
//! Skips when no key is present.

use snapsolve_lib::interpret::interpret_solution;
use snapsolve_lib::llm::prompts::build_solution_message;
use snapsolve_lib::llm::{
    AnthropicClient, InferenceClient, InferencePurpose, InferenceRequest, ProblemExample,
    ProblemInfo,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn load_env() -> bool {
    let manifest_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let env_path = manifest_dir.join(".env.local");
    if env_path.exists() {
        dotenvy::from_path(&env_path).expect("Failed to load .env.local");
        eprintln!("[TEST] Loaded {}", env_path.display());
    }
    std::env::var("ANTHROPIC_API_KEY")
        .map(|k| !k.is_empty())
        .unwrap_or(false)
}

fn reverse_string_problem() -> ProblemInfo {
    ProblemInfo {
        title: "Reverse A String In Place".to_string(),
        description: "Given a list of characters, reverse it in place and return it.".to_string(),
        examples: vec![ProblemExample {
            input: "[\"h\",\"e\",\"y\"]".to_string(),
            output: "[\"y\",\"e\",\"h\"]".to_string(),
            explanation: None,
        }],
        constraints: vec!["1 <= len(s) <= 10^5".to_string()],
        ..Default::default()
    }
}

#[tokio::test]
async fn live_solution_interprets_into_code() {
    if !load_env() {
        eprintln!("SKIP: No ANTHROPIC_API_KEY");
        return;
    }

    let client = AnthropicClient::new();
    let prompt = build_solution_message(&reverse_string_problem(), "python");
    let request = InferenceRequest::text(InferencePurpose::GenerateSolution, prompt);

    let start = std::time::Instant::now();
    let raw = client
        .infer(&request, &CancellationToken::new(), Duration::from_secs(120))
        .await
        .expect("solution request failed");
    eprintln!("[TEST] Reply in {}ms ({} chars)", start.elapsed().as_millis(), raw.len());

    let solution = interpret_solution(&raw);
    eprintln!("[TEST] time: {}, space: {}", solution.time_complexity, solution.space_complexity);
    for thought in &solution.thoughts {
        eprintln!("[TEST]   - {}", thought);
    }

    assert!(!solution.code.trim().is_empty());
    assert_ne!(solution.code.trim(), raw.trim(), "expected code, got the raw reply");
    assert!(solution.time_complexity.starts_with("O("));
}

#[tokio::test]
async fn live_request_honours_cancellation() {
    if !load_env() {
        eprintln!("SKIP: No ANTHROPIC_API_KEY");
        return;
    }

    let client = AnthropicClient::new();
    let request = InferenceRequest::text(
        InferencePurpose::GenerateSolution,
        build_solution_message(&reverse_string_problem(), "python"),
    );
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = client.infer(&request, &cancel, Duration::from_secs(120)).await;
    assert!(matches!(result, Err(e) if e.is_cancelled()));
}
