//! Solution interpretation: code, reasoning and complexity from model text.

use super::json::try_parse_solution;
use super::{fenced_blocks, first_fence};
use crate::llm::types::DEFAULT_COMPLEXITY;
use crate::llm::SolutionResult;
use crate::ocr::heuristics::{code_runs, is_code_line};
use regex::Regex;
use std::sync::OnceLock;

const MIN_THOUGHT_CHARS: usize = 10;
const MAX_COMPLEXITY_CHARS: usize = 80;

fn reflective_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^[ \t]*(?:#+|//|\*\*)?[ \t]*(?:my thoughts|analysis|approach)[ \t]*\**[ \t]*(?::\**(.*))?$")
            .unwrap()
    })
}

struct ComplexityPatterns {
    notation: Regex,
    line: Regex,
}

impl ComplexityPatterns {
    fn new(kind: &str) -> Self {
        let label = format!(r"(?i){}[ \t]+complexity[ \t*`]*(?:is|:|-|=|of)?[ \t*`]*", kind);
        Self {
            notation: Regex::new(&format!(r"{}(O\((?:[^()\n]|\([^()\n]*\))*\))", label)).unwrap(),
            line: Regex::new(&format!(r"{}([^\n]+)", label)).unwrap(),
        }
    }

    fn find(&self, text: &str) -> String {
        if let Some(m) = self.notation.captures(text).and_then(|c| c.get(1)) {
            return m.as_str().to_string();
        }
        self.line
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim_matches(&['*', '`', '.', ' '][..]).to_string())
            .filter(|s| !s.is_empty() && s.chars().count() <= MAX_COMPLEXITY_CHARS)
            .unwrap_or_else(|| DEFAULT_COMPLEXITY.to_string())
    }
}

fn time_patterns() -> &'static ComplexityPatterns {
    static P: OnceLock<ComplexityPatterns> = OnceLock::new();
    P.get_or_init(|| ComplexityPatterns::new("time"))
}

fn space_patterns() -> &'static ComplexityPatterns {
    static P: OnceLock<ComplexityPatterns> = OnceLock::new();
    P.get_or_init(|| ComplexityPatterns::new("space"))
}

/// Parse a generated solution. Never fails; missing parts get defaults.
pub fn interpret_solution(raw: &str) -> SolutionResult {
    if let Some(mut solution) = try_parse_solution(raw) {
        log::info!("[PARSE] Solution parsed via json strategy");
        solution.code = strip_reflective_sections(&solution.code);
        return solution;
    }

    let blocks = fenced_blocks(raw);
    let code = match blocks.iter().max_by_key(|b| b.len()) {
        Some(largest) => largest.clone(),
        None => {
            let runs = code_runs(raw);
            if runs.is_empty() {
                log::warn!("[PARSE] No code found in solution — using full text");
                raw.trim().to_string()
            } else {
                runs.join("\n\n")
            }
        }
    };

    let prose = match first_fence(raw) {
        Some(idx) => &raw[..idx],
        None => raw,
    };

    let solution = SolutionResult {
        code: strip_reflective_sections(&code),
        thoughts: thoughts_from(prose),
        time_complexity: time_patterns().find(raw),
        space_complexity: space_patterns().find(raw),
    };
    log::info!(
        "[PARSE] Solution: {} chars of code, {} thoughts, time {}, space {}",
        solution.code.len(),
        solution.thoughts.len(),
        solution.time_complexity,
        solution.space_complexity
    );
    solution
}

/// Paragraphs of reasoning longer than a few words.
///
/// Bulleted paragraphs yield one thought per bullet. Headings, code lines
/// and complexity lines are dropped.
fn thoughts_from(prose: &str) -> Vec<String> {
    let mut thoughts = Vec::new();
    for paragraph in prose.split("\n\n") {
        let mut lines: Vec<String> = Vec::new();
        for line in paragraph.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || is_code_line(line) || is_complexity_line(trimmed) {
                continue;
            }
            if let Some(cap) = reflective_heading().captures(trimmed) {
                let inline = cap.get(1).map(|m| m.as_str().trim()).unwrap_or("");
                if !inline.is_empty() {
                    lines.push(inline.to_string());
                }
                continue;
            }
            if trimmed.starts_with('#') {
                continue;
            }
            lines.push(trimmed.to_string());
        }
        if lines.is_empty() {
            continue;
        }

        if lines.iter().all(|l| bullet_body(l).is_some()) {
            thoughts.extend(lines.iter().filter_map(|l| bullet_body(l)).map(str::to_string));
        } else {
            thoughts.push(lines.join(" "));
        }
    }
    thoughts.retain(|t| t.chars().count() > MIN_THOUGHT_CHARS);
    thoughts
}

fn bullet_body(line: &str) -> Option<&str> {
    if let Some(rest) = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("• "))
    {
        return Some(rest.trim());
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    rest.strip_prefix(". ")
        .or_else(|| rest.strip_prefix(") "))
        .map(str::trim)
}

fn is_complexity_line(trimmed: &str) -> bool {
    let lower = trimmed.trim_start_matches(&['*', '-', '#', ' '][..]).to_lowercase();
    lower.starts_with("time complexity") || lower.starts_with("space complexity")
}

/// Remove "My Thoughts" / "Analysis" / "Approach" sections from code text.
///
/// A section runs from its heading to the next blank line or code line.
pub fn strip_reflective_sections(text: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut skipping = false;
    for line in text.lines() {
        if reflective_heading().is_match(line) {
            skipping = true;
            continue;
        }
        if skipping {
            if line.trim().is_empty() {
                skipping = false;
                continue;
            }
            if !is_code_line(line) {
                continue;
            }
            skipping = false;
        }
        kept.push(line);
    }
    kept.join("\n")
        .trim_start_matches(&['\n', '\r'][..])
        .trim_end()
        .to_string()
}
