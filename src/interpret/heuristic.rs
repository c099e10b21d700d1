//! Heuristic strategy: recover problem structure from labelled plain text.
//!
//! Works on both model prose and raw OCR output. Succeeds only when some
//! structure (a label, code, examples, constraints) was actually found.

use super::{fenced_blocks, first_fence, truncate_chars, MAX_FALLBACK_CHARS};
use crate::llm::{ProblemExample, ProblemInfo};
use crate::ocr::heuristics::{code_runs, is_code_line};
use regex::Regex;
use std::sync::OnceLock;

const TITLE_MIN_CHARS: usize = 10;
const TITLE_MAX_CHARS: usize = 100;

fn title_label() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^[ \t]*(?:#+[ \t]*)?\**(?:title|problem|question)(?:[ \t]+title)?\**[ \t]*[:\-][ \t]*\**(.+?)\**[ \t]*$")
            .unwrap()
    })
}

fn description_label() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^[ \t]*(?:#+[ \t]*)?\**(?:description|problem statement|problem description|statement)\**[ \t]*:?\**[ \t]*(.*)$")
            .unwrap()
    })
}

/// Lines that end a free-text description.
fn section_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^[ \t]*(?:#+[ \t]*)?\**[ \t]*(?:examples?\b|input\s*:|output\s*:|constraints?\b|note\s*:|follow[- ]?up\b|```)")
            .unwrap()
    })
}

fn example_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^[ \t#*]*examples?[ \t]*(?:\d+)?[ \t*]*:?[ \t*]*").unwrap()
    })
}

fn example_label() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(input|output|explanation)\**[ \t]*:").unwrap())
}

/// Lines that close the last example before trailing sections.
fn example_terminator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^[ \t#*]*(?:constraints?\b|note\s*:|follow[- ]?up\b|```)").unwrap()
    })
}

fn constraints_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^[ \t#*]*constraints?[ \t*]*:?[ \t*]*(.*)$").unwrap())
}

fn bullet() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s+(.+)$").unwrap())
}

const SIGNATURE_KEYWORDS: &[&str] = &[
    "def", "func", "function", "fn", "public", "private", "protected", "static", "class",
];

pub fn try_parse(text: &str) -> Option<ProblemInfo> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let labelled_title = title_label()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty());
    let title = labelled_title
        .clone()
        .or_else(|| leading_title(text))
        .unwrap_or_default();

    let labelled_description = labelled_description(text);
    let found_description = labelled_description.is_some();
    let mut description = labelled_description
        .or_else(|| leading_description(text, &title))
        .unwrap_or_default();

    let code = extract_code(text);
    let examples = parse_examples(text);
    let constraints = parse_constraints(text);
    let function_signature = signature_from(&code);

    let structured = labelled_title.is_some()
        || found_description
        || !code.is_empty()
        || !examples.is_empty()
        || !constraints.is_empty();
    if !structured {
        return None;
    }

    if description.is_empty() {
        description = truncate_chars(text, MAX_FALLBACK_CHARS).to_string();
    }

    Some(ProblemInfo {
        title,
        description,
        code,
        examples,
        constraints,
        function_signature,
        extra_info: None,
    })
}

fn strip_markup(line: &str) -> &str {
    line.trim()
        .trim_start_matches('#')
        .trim_matches('*')
        .trim()
}

/// First short prose line that reads like a heading.
fn leading_title(text: &str) -> Option<String> {
    let line = text.lines().find(|l| !l.trim().is_empty())?;
    if is_code_line(line) || section_marker().is_match(line) || description_label().is_match(line)
    {
        return None;
    }
    let candidate = strip_markup(line);
    let len = candidate.chars().count();
    (TITLE_MIN_CHARS..=TITLE_MAX_CHARS)
        .contains(&len)
        .then(|| candidate.to_string())
}

/// Text after a "Description:" style label, up to the next section.
fn labelled_description(text: &str) -> Option<String> {
    let mut lines = text.lines();
    let mut collected = Vec::new();
    let mut found = false;
    for line in lines.by_ref() {
        if let Some(cap) = description_label().captures(line) {
            found = true;
            let inline = cap.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            if !inline.is_empty() {
                collected.push(inline);
            }
            break;
        }
    }
    if !found {
        return None;
    }
    for line in lines {
        if section_marker().is_match(line) || title_label().is_match(line) {
            break;
        }
        collected.push(line.trim_end());
    }
    let joined = collected.join("\n").trim().to_string();
    (!joined.is_empty()).then_some(joined)
}

/// Prose before the first fence, example, input marker or code line.
fn leading_description(text: &str, title: &str) -> Option<String> {
    let cutoff = first_fence(text).unwrap_or(text.len());
    let mut collected = Vec::new();
    let mut skipped_title = title.is_empty();
    for line in text[..cutoff].lines() {
        if section_marker().is_match(line) || is_code_line(line) {
            break;
        }
        if !skipped_title && strip_markup(line) == title {
            skipped_title = true;
            continue;
        }
        if title_label().is_match(line) {
            continue;
        }
        collected.push(line.trim_end());
    }
    let joined = collected.join("\n").trim().to_string();
    (!joined.is_empty()).then_some(joined)
}

/// All fenced blocks, or failing that, runs of code-like lines.
fn extract_code(text: &str) -> String {
    let blocks = fenced_blocks(text);
    if !blocks.is_empty() {
        return blocks.join("\n\n");
    }
    code_runs(text).join("\n\n")
}

/// Input/Output/Explanation triples, one per "Example N" section.
///
/// Text without example headers is treated as a single section.
pub fn parse_examples(text: &str) -> Vec<ProblemExample> {
    let headers: Vec<(usize, usize)> = example_header()
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect();

    let sections: Vec<&str> = if headers.is_empty() {
        vec![text]
    } else {
        headers
            .iter()
            .enumerate()
            .map(|(i, &(_, body_start))| {
                let end = headers.get(i + 1).map(|h| h.0).unwrap_or(text.len());
                &text[body_start..end]
            })
            .collect()
    };

    sections
        .into_iter()
        .filter_map(|section| {
            let section = match example_terminator().find(section) {
                Some(m) => &section[..m.start()],
                None => section,
            };
            parse_example_section(section)
        })
        .collect()
}

fn parse_example_section(section: &str) -> Option<ProblemExample> {
    let labels: Vec<(String, usize, usize)> = example_label()
        .captures_iter(section)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let name = cap.get(1)?.as_str().to_lowercase();
            Some((name, whole.start(), whole.end()))
        })
        .collect();

    let mut example = ProblemExample::default();
    for (i, (name, _, value_start)) in labels.iter().enumerate() {
        let end = labels.get(i + 1).map(|l| l.1).unwrap_or(section.len());
        let value = section[*value_start..end].trim().to_string();
        match name.as_str() {
            "input" if example.input.is_empty() => example.input = value,
            "output" if example.output.is_empty() => example.output = value,
            "explanation" if example.explanation.is_none() && !value.is_empty() => {
                example.explanation = Some(value)
            }
            _ => {}
        }
    }

    (!example.input.is_empty() && !example.output.is_empty()).then_some(example)
}

/// Bulleted, numbered or inequality lines following a "Constraints" label.
fn parse_constraints(text: &str) -> Vec<String> {
    let mut lines = text.lines();
    let mut constraints = Vec::new();
    let mut found = false;
    for line in lines.by_ref() {
        if let Some(cap) = constraints_header().captures(line) {
            found = true;
            let inline = cap.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            if !inline.is_empty() {
                constraints.push(inline.to_string());
            }
            break;
        }
    }
    if !found {
        return constraints;
    }

    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if constraints.is_empty() {
                continue;
            }
            break;
        }
        if let Some(cap) = bullet().captures(line) {
            constraints.push(cap[1].trim().to_string());
        } else if looks_like_bound(trimmed) {
            constraints.push(trimmed.to_string());
        } else {
            break;
        }
    }
    constraints
}

fn looks_like_bound(line: &str) -> bool {
    ["<=", ">=", "≤", "≥", " < ", " > "]
        .iter()
        .any(|op| line.contains(op))
}

/// First code line that declares a function or class.
fn signature_from(code: &str) -> String {
    code.lines()
        .map(str::trim)
        .find(|line| {
            line.contains('(')
                && SIGNATURE_KEYWORDS.iter().any(|kw| {
                    line.strip_prefix(kw)
                        .map(|rest| rest.starts_with(' '))
                        .unwrap_or(false)
                })
        })
        .map(|line| line.trim_end_matches('{').trim_end().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEETCODE_STYLE: &str = "\
## Two Sum In An Array

Given an array of integers nums and an integer target, return indices of the two numbers such that they add up to target.

Example 1:
Input: nums = [2,7,11,15], target = 9
Output: [0,1]
Explanation: Because nums[0] + nums[1] == 9, we return [0, 1].

Example 2:
Input: nums = [3,2,4], target = 6
Output: [1,2]

Constraints:
- 2 <= nums.length <= 10^4
- -10^9 <= nums[i] <= 10^9

```python
class Solution:
    def twoSum(self, nums, target):
        pass
```";

    #[test]
    fn parses_a_full_statement() {
        let problem = try_parse(LEETCODE_STYLE).unwrap();
        assert_eq!(problem.title, "Two Sum In An Array");
        assert!(problem.description.starts_with("Given an array of integers"));
        assert!(!problem.description.contains("Two Sum"));
        assert_eq!(problem.examples.len(), 2);
        assert_eq!(problem.examples[0].input, "nums = [2,7,11,15], target = 9");
        assert_eq!(problem.examples[0].output, "[0,1]");
        assert!(problem.examples[0]
            .explanation
            .as_deref()
            .unwrap()
            .starts_with("Because"));
        assert_eq!(problem.examples[1].explanation, None);
        assert_eq!(
            problem.constraints,
            vec!["2 <= nums.length <= 10^4", "-10^9 <= nums[i] <= 10^9"]
        );
        assert!(problem.code.starts_with("class Solution:"));
        assert_eq!(problem.function_signature, "def twoSum(self, nums, target):");
    }

    #[test]
    fn unfenced_code_is_recovered() {
        let problem = try_parse("func foo(n): return n*2").unwrap();
        assert!(problem.code.contains("func foo"));
        assert!(!problem.description.is_empty());
        assert_eq!(problem.function_signature, "func foo(n): return n*2");
    }

    #[test]
    fn labelled_fields_win() {
        let text = "Title: Valid Anagram\nDescription: Decide whether t is an anagram of s.\nInput: s = \"ab\", t = \"ba\"\nOutput: true";
        let problem = try_parse(text).unwrap();
        assert_eq!(problem.title, "Valid Anagram");
        assert_eq!(problem.description, "Decide whether t is an anagram of s.");
        assert_eq!(problem.examples.len(), 1);
        assert_eq!(problem.examples[0].output, "true");
    }

    #[test]
    fn plain_prose_is_not_structure() {
        assert!(try_parse("Just a sentence about nothing in particular.").is_none());
        assert!(try_parse("   ").is_none());
    }

    #[test]
    fn unlabelled_constraint_lines_are_kept() {
        let text = "Constraints:\n1 <= n <= 45\n\nMore prose.";
        assert_eq!(parse_constraints(text), vec!["1 <= n <= 45"]);
    }
}
