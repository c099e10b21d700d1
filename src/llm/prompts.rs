//! LLM prompt constants and message builders.
//!
//! These prompts are the contract between the pipeline and the model: the
//! interpreter in `crate::interpret` expects the shapes they ask for, but
//! tolerates anything.

use super::types::ProblemInfo;
use crate::ocr::heuristics::detect_code_structure;

pub const MODEL: &str = "claude-haiku-4-5-20251001";
pub const GEMINI_MODEL: &str = "gemini-2.0-flash";

pub const EXTRACT_MAX_TOKENS: u32 = 2048;
pub const SOLUTION_MAX_TOKENS: u32 = 4096;
pub const DEBUG_MAX_TOKENS: u32 = 2048;

/// EXTRACT system prompt — a screenshot of a coding problem comes in,
/// a ProblemInfo JSON object goes out.
pub const EXTRACT_SYSTEM_PROMPT: &str = r#"You read screenshots of programming problems and extract the problem statement.

<rules>
1. Respond with ONLY a JSON object. No prose, no markdown fences.
2. Copy code exactly as shown, preserving indentation.
3. Use empty strings or empty arrays for anything not visible. Never invent examples or constraints.
4. If the screenshot shows a starter function, put its signature line in function_signature.
</rules>

<response_format>
{
  "title": "<short problem title>",
  "description": "<full problem statement>",
  "code": "<starter code or code shown, verbatim>",
  "examples": [
    {"input": "<input>", "output": "<output>", "explanation": "<explanation or empty>"}
  ],
  "constraints": ["<one constraint per entry>"],
  "function_signature": "<signature line or empty>"
}
</response_format>"#;

/// SOLUTION system prompt — ProblemInfo in, reasoning + code + complexity out.
pub const SOLUTION_SYSTEM_PROMPT: &str = r#"You are an expert competitive programmer. Solve the problem you are given.

<response_format>
Start with a section titled "My Thoughts" containing 2-5 short paragraphs explaining the approach.
Then give the complete solution in ONE fenced code block.
End with exactly these two lines:
Time complexity: O(...)
Space complexity: O(...)
</response_format>"#;

/// DEBUG system prompt — a screenshot of failing output or an error comes in,
/// an analysis of what went wrong comes out.
pub const DEBUG_SYSTEM_PROMPT: &str = r#"You are reviewing a screenshot taken while debugging a solution to a programming problem. It may show an error message, failing test output, or modified code.

Explain concisely:
1. What the screenshot shows (error, failing case, or code).
2. The most likely cause.
3. The specific change that fixes it, as a fenced code block when code changes are needed.

Plain text and markdown only. No JSON."#;

/// Builds the user message for the SOLUTION call.
pub fn build_solution_message(problem: &ProblemInfo, language: &str) -> String {
    let mut msg = String::new();
    msg.push_str(&format!("<language>{}</language>\n\n", language));
    if !problem.title.is_empty() {
        msg.push_str(&format!("<title>{}</title>\n\n", problem.title));
    }
    msg.push_str(&format!("<description>\n{}\n</description>\n", problem.description));

    if !problem.examples.is_empty() {
        msg.push_str("\n<examples>\n");
        for (i, ex) in problem.examples.iter().enumerate() {
            msg.push_str(&format!(
                "Example {}:\nInput: {}\nOutput: {}\n",
                i + 1,
                ex.input,
                ex.output
            ));
            if let Some(explanation) = &ex.explanation {
                msg.push_str(&format!("Explanation: {}\n", explanation));
            }
        }
        msg.push_str("</examples>\n");
    }

    if !problem.constraints.is_empty() {
        msg.push_str("\n<constraints>\n");
        for c in &problem.constraints {
            msg.push_str(&format!("- {}\n", c));
        }
        msg.push_str("</constraints>\n");
    }

    if !problem.function_signature.is_empty() {
        msg.push_str(&format!(
            "\n<function_signature>{}</function_signature>\n",
            problem.function_signature
        ));
    }
    if !problem.code.is_empty() {
        msg.push_str(&format!("\n<starter_code>\n{}\n</starter_code>\n", problem.code));
        if detect_code_structure(&problem.code) {
            msg.push_str("\n<hint>has_code: true. Complete the starter code and keep its signature.</hint>\n");
        }
    }
    msg
}
