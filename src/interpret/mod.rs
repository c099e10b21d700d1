//! Response interpretation — raw model/OCR text into structured results.
//!
//! Problem text goes through an ordered list of pure strategies; the first
//! one that returns `Some` wins:
//!   1. json.rs      — embedded JSON object
//!   2. heuristic.rs — labels, code fences, example/constraint patterns
//! and, when neither succeeds, a last-resort wrap of the leading text.
//! Interpretation never fails.
//!
//! Solution text has its own interpreter in solution.rs.

mod heuristic;
mod json;
mod solution;

pub use solution::{interpret_solution, strip_reflective_sections};

use crate::llm::ProblemInfo;
use regex::Regex;
use std::sync::OnceLock;

/// Leading characters kept when wrapping unstructured text.
pub const MAX_FALLBACK_CHARS: usize = 1000;

const EMPTY_DESCRIPTION: &str = "No problem statement could be extracted from the capture.";

pub type Strategy = fn(&str) -> Option<ProblemInfo>;

/// Problem strategies in priority order.
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("json", json::try_parse_problem),
    ("heuristic", heuristic::try_parse),
];

/// Parse raw text into a best-effort ProblemInfo.
pub fn interpret(raw: &str) -> ProblemInfo {
    for (name, strategy) in STRATEGIES {
        if let Some(mut problem) = strategy(raw) {
            log::info!("[PARSE] Problem parsed via {} strategy", name);
            if problem.description.trim().is_empty() {
                problem.description = last_resort(raw).description;
            }
            return problem;
        }
    }
    log::warn!(
        "[PARSE] No structure found in {} chars — wrapping as description",
        raw.len()
    );
    last_resort(raw)
}

/// Wrap the leading text as a description with empty structured fields.
pub fn last_resort(raw: &str) -> ProblemInfo {
    let trimmed = raw.trim();
    let description = if trimmed.is_empty() {
        EMPTY_DESCRIPTION.to_string()
    } else {
        truncate_chars(trimmed, MAX_FALLBACK_CHARS).to_string()
    };
    ProblemInfo {
        description,
        ..Default::default()
    }
}

/// First `max` characters of `text`, on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```[^\n`]*\n(.*?)```").expect("valid fence regex"))
}

/// Contents of every fenced code block, in order.
pub fn fenced_blocks(text: &str) -> Vec<String> {
    fence_regex()
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().trim_end().to_string())
        .filter(|block| !block.trim().is_empty())
        .collect()
}

/// Byte offset of the first fence opener, if any.
pub fn first_fence(text: &str) -> Option<usize> {
    text.find("```")
}

/// Candidate JSON objects embedded in `text`, fenced ones first.
///
/// Each candidate is a brace-balanced span starting at a `{`; string
/// literals and escapes are respected while balancing.
pub fn json_object_candidates(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    for m in fence_regex().captures_iter(text).filter_map(|c| c.get(1)) {
        let body = m.as_str().trim();
        if body.starts_with('{') {
            out.push(body);
        }
    }

    let bytes = text.as_bytes();
    let mut start = 0;
    while let Some(offset) = text[start..].find('{') {
        let open = start + offset;
        if let Some(close) = balanced_end(bytes, open) {
            out.push(&text[open..=close]);
            start = close + 1;
        } else {
            start = open + 1;
        }
    }
    out
}

fn balanced_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prose_without_json_or_fences_still_has_a_description() {
        let raw = "Given a string s, find the length of the longest substring without repeating characters.";
        let problem = interpret(raw);
        assert!(!problem.description.is_empty());
    }

    #[test]
    fn empty_and_garbage_input_never_panics() {
        for raw in ["", "   \n\t", "{{{{", "}}}", "```", "{\"title\": ", "\u{0}\u{1}"] {
            let problem = interpret(raw);
            assert!(!problem.description.is_empty(), "input {:?}", raw);
        }
    }

    #[test]
    fn title_only_json_keeps_a_description() {
        let raw = r#"{"title": "Two Sum"}"#;
        let problem = interpret(raw);
        assert_eq!(problem.title, "Two Sum");
        assert_eq!(problem.description, raw);

        let fenced = "```json\n{\"code\": \"def f(): pass\"}\n```";
        let problem = interpret(fenced);
        assert_eq!(problem.code, "def f(): pass");
        assert!(!problem.description.trim().is_empty());
    }

    #[test]
    fn last_resort_truncates_long_text() {
        let raw = "x".repeat(5000);
        let problem = last_resort(&raw);
        assert_eq!(problem.description.chars().count(), MAX_FALLBACK_CHARS);
        assert!(problem.code.is_empty());
        assert!(problem.examples.is_empty());
    }

    #[test]
    fn json_candidates_skip_braces_inside_strings() {
        let text = r#"Here you go: {"code": "if (x) { y(); }", "title": "T"} done"#;
        let candidates = json_object_candidates(text);
        assert_eq!(candidates[0], r#"{"code": "if (x) { y(); }", "title": "T"}"#);
    }

    #[test]
    fn fenced_blocks_in_order() {
        let text = "a\n```python\nx = 1\n```\nb\n```\ny = 2\n```";
        assert_eq!(fenced_blocks(text), vec!["x = 1".to_string(), "y = 2".to_string()]);
    }
}
