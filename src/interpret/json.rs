//! JSON strategy: the model was asked for a JSON object, so try that first.
//!
//! Field names vary between models (`problem_statement` vs `description`,
//! camelCase vs snake_case), and list fields sometimes arrive as plain
//! strings. Values are read from a loose `serde_json::Value` to tolerate both.

use super::json_object_candidates;
use crate::llm::types::DEFAULT_COMPLEXITY;
use crate::llm::{ProblemExample, ProblemInfo, SolutionResult};
use serde_json::{Map, Value};

const TITLE_KEYS: &[&str] = &["title", "problem_title", "problemTitle", "name"];
const DESCRIPTION_KEYS: &[&str] = &[
    "description",
    "problem_statement",
    "problemStatement",
    "problem_description",
    "statement",
];
const CODE_KEYS: &[&str] = &["code", "starter_code", "starterCode", "code_snippet"];
const SIGNATURE_KEYS: &[&str] = &["function_signature", "functionSignature", "signature"];
const EXAMPLE_KEYS: &[&str] = &["examples", "test_cases", "testCases"];
const CONSTRAINT_KEYS: &[&str] = &["constraints"];

/// First embedded JSON object that carries at least one problem field.
pub fn try_parse_problem(text: &str) -> Option<ProblemInfo> {
    json_object_candidates(text)
        .into_iter()
        .filter_map(parse_object)
        .find_map(|obj| {
            let problem = problem_from_object(&obj);
            (!problem.is_blank()).then_some(problem)
        })
}

/// First embedded JSON object with a non-empty `code` field.
pub fn try_parse_solution(text: &str) -> Option<SolutionResult> {
    json_object_candidates(text)
        .into_iter()
        .filter_map(parse_object)
        .find_map(|obj| {
            let code = string_field(&obj, &["code", "solution"]);
            if code.trim().is_empty() {
                return None;
            }
            let time = string_field(&obj, &["time_complexity", "timeComplexity"]);
            let space = string_field(&obj, &["space_complexity", "spaceComplexity"]);
            Some(SolutionResult {
                code,
                thoughts: list_field(&obj, &["thoughts", "reasoning"]),
                time_complexity: or_default(time),
                space_complexity: or_default(space),
            })
        })
}

fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(obj)) => Some(obj),
        _ => None,
    }
}

fn problem_from_object(obj: &Map<String, Value>) -> ProblemInfo {
    ProblemInfo {
        title: string_field(obj, TITLE_KEYS),
        description: string_field(obj, DESCRIPTION_KEYS),
        code: string_field(obj, CODE_KEYS),
        examples: examples_field(obj),
        constraints: list_field(obj, CONSTRAINT_KEYS),
        function_signature: string_field(obj, SIGNATURE_KEYS),
        extra_info: None,
    }
}

fn lookup<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k)).filter(|v| !v.is_null())
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> String {
    lookup(obj, keys).map(value_to_string).unwrap_or_default()
}

/// Arrays of strings, or a single newline-separated string.
fn list_field(obj: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    let items: Vec<String> = match lookup(obj, keys) {
        Some(Value::Array(items)) => items.iter().map(value_to_string).collect(),
        Some(Value::String(s)) => s.lines().map(|l| l.trim().to_string()).collect(),
        Some(other) => vec![value_to_string(other)],
        None => Vec::new(),
    };
    items
        .into_iter()
        .map(|s| s.trim_start_matches(&['-', '*', '•', ' '][..]).to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn examples_field(obj: &Map<String, Value>) -> Vec<ProblemExample> {
    let Some(Value::Array(items)) = lookup(obj, EXAMPLE_KEYS) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(ex) => {
                let explanation = string_field(ex, &["explanation"]);
                Some(ProblemExample {
                    input: string_field(ex, &["input"]),
                    output: string_field(ex, &["output", "expected", "expected_output"]),
                    explanation: (!explanation.is_empty()).then_some(explanation),
                })
            }
            Value::String(s) => super::heuristic::parse_examples(s)
                .into_iter()
                .next()
                .or_else(|| {
                    (!s.trim().is_empty()).then(|| ProblemExample {
                        input: s.trim().to_string(),
                        ..Default::default()
                    })
                }),
            _ => None,
        })
        .filter(|ex| !ex.input.is_empty() || !ex.output.is_empty())
        .collect()
}

fn or_default(complexity: String) -> String {
    if complexity.is_empty() {
        DEFAULT_COMPLEXITY.to_string()
    } else {
        complexity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_problem_json() {
        let text = r#"Sure, here it is:
```json
{
  "title": "Two Sum",
  "problem_statement": "Return indices of the two numbers that add up to target.",
  "code": "def two_sum(nums, target):\n    pass",
  "function_signature": "def two_sum(nums, target)",
  "examples": [{"input": "nums = [2,7], target = 9", "output": "[0,1]"}],
  "constraints": ["2 <= nums.length", "- only one answer"]
}
```"#;
        let problem = try_parse_problem(text).unwrap();
        assert_eq!(problem.title, "Two Sum");
        assert!(problem.description.starts_with("Return indices"));
        assert_eq!(problem.function_signature, "def two_sum(nums, target)");
        assert_eq!(problem.examples.len(), 1);
        assert_eq!(problem.examples[0].output, "[0,1]");
        assert_eq!(problem.examples[0].explanation, None);
        assert_eq!(problem.constraints, vec!["2 <= nums.length", "only one answer"]);
    }

    #[test]
    fn tolerates_string_constraints_and_string_examples() {
        let text = r#"{"description": "d", "constraints": "a < b\nb < c", "examples": ["Input: 1\nOutput: 2"]}"#;
        let problem = try_parse_problem(text).unwrap();
        assert_eq!(problem.constraints, vec!["a < b", "b < c"]);
        assert_eq!(problem.examples[0].input, "1");
        assert_eq!(problem.examples[0].output, "2");
    }

    #[test]
    fn rejects_objects_without_problem_fields() {
        assert!(try_parse_problem(r#"{"unrelated": 1}"#).is_none());
        assert!(try_parse_problem(r#"{"title": "unterminated"#).is_none());
        assert!(try_parse_problem("no json here").is_none());
    }

    #[test]
    fn skips_unrelated_object_before_the_problem() {
        let text = r#"meta {"ok": true} then {"title": "Valid Parentheses"}"#;
        assert_eq!(try_parse_problem(text).unwrap().title, "Valid Parentheses");
    }

    #[test]
    fn solution_json_defaults_missing_complexity() {
        let text = r#"{"code": "return 1", "thoughts": ["Constant answer works here"], "timeComplexity": "O(1)"}"#;
        let solution = try_parse_solution(text).unwrap();
        assert_eq!(solution.code, "return 1");
        assert_eq!(solution.time_complexity, "O(1)");
        assert_eq!(solution.space_complexity, "O(n)");
        assert_eq!(solution.thoughts.len(), 1);
    }
}
