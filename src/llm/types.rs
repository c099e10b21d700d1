//! Structured results published to the UI boundary.
//!
//! Model output is parsed into these by `crate::interpret`; they are
//! serialized camelCase for the frontend.

use serde::{Deserialize, Serialize};

/// One worked example from a problem statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemExample {
    pub input: String,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// The problem extracted by the initial pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemInfo {
    pub title: String,
    pub description: String,
    pub code: String,
    pub examples: Vec<ProblemExample>,
    pub constraints: Vec<String>,
    pub function_signature: String,
    /// Merged debug analyses, set by the debug pipeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_info: Option<String>,
}

impl ProblemInfo {
    /// True when no structured field carries anything.
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty()
            && self.description.trim().is_empty()
            && self.code.trim().is_empty()
            && self.examples.is_empty()
            && self.constraints.is_empty()
            && self.function_signature.trim().is_empty()
    }

    /// Fill empty fields from `other`, keeping everything already set.
    pub fn fill_missing_from(&mut self, other: ProblemInfo) {
        if self.title.trim().is_empty() {
            self.title = other.title;
        }
        if self.description.trim().is_empty() {
            self.description = other.description;
        }
        if self.code.trim().is_empty() {
            self.code = other.code;
        }
        if self.examples.is_empty() {
            self.examples = other.examples;
        }
        if self.constraints.is_empty() {
            self.constraints = other.constraints;
        }
        if self.function_signature.trim().is_empty() {
            self.function_signature = other.function_signature;
        }
        if self.extra_info.is_none() {
            self.extra_info = other.extra_info;
        }
    }
}

/// A generated solution for the current problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionResult {
    pub code: String,
    pub thoughts: Vec<String>,
    pub time_complexity: String,
    pub space_complexity: String,
}

pub const DEFAULT_COMPLEXITY: &str = "O(n)";

impl Default for SolutionResult {
    fn default() -> Self {
        Self {
            code: String::new(),
            thoughts: Vec::new(),
            time_complexity: DEFAULT_COMPLEXITY.to_string(),
            space_complexity: DEFAULT_COMPLEXITY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_missing_keeps_existing_fields() {
        let mut primary = ProblemInfo {
            description: "From the model".to_string(),
            ..Default::default()
        };
        primary.fill_missing_from(ProblemInfo {
            description: "From OCR".to_string(),
            code: "def f(): pass".to_string(),
            ..Default::default()
        });
        assert_eq!(primary.description, "From the model");
        assert_eq!(primary.code, "def f(): pass");
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(ProblemInfo {
            function_signature: "def f(x)".to_string(),
            extra_info: Some("note".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(json["functionSignature"], "def f(x)");
        assert_eq!(json["extraInfo"], "note");

        let json = serde_json::to_value(SolutionResult::default()).unwrap();
        assert_eq!(json["timeComplexity"], "O(n)");
    }
}
