//! Questionnaire answers as produced by the intake form.
//!
//! An answer is one of four shapes. Comparison between a configured answer value and a
//! patient's answer is an explicit per-variant dispatch: values of different shapes never
//! compare equal and no coercion is attempted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single answer value.
///
/// Serialised untagged, so in JSON or YAML an answer is written as a plain string, boolean,
/// number or list of strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Boolean(bool),
    Number(f64),
    Text(String),
    /// Options picked in a multi-select question, in the order they were selected.
    MultiSelect(Vec<String>),
}

impl AnswerValue {
    /// Returns `true` when `self` and `other` are the same answer.
    ///
    /// Multi-select answers match only when both lists hold the same options in the same
    /// order: `["a", "b"]` does not match `["b", "a"]`.
    pub fn matches(&self, other: &AnswerValue) -> bool {
        match (self, other) {
            (AnswerValue::Text(a), AnswerValue::Text(b)) => a == b,
            (AnswerValue::Boolean(a), AnswerValue::Boolean(b)) => a == b,
            (AnswerValue::Number(a), AnswerValue::Number(b)) => a == b,
            (AnswerValue::MultiSelect(a), AnswerValue::MultiSelect(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y)
            }
            _ => false,
        }
    }

    /// Short name of the variant, used in log output.
    pub fn kind(&self) -> &'static str {
        match self {
            AnswerValue::Text(_) => "text",
            AnswerValue::Boolean(_) => "boolean",
            AnswerValue::Number(_) => "number",
            AnswerValue::MultiSelect(_) => "multi_select",
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_owned())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        AnswerValue::Text(value)
    }
}

impl From<bool> for AnswerValue {
    fn from(value: bool) -> Self {
        AnswerValue::Boolean(value)
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        AnswerValue::Number(value)
    }
}

impl From<Vec<String>> for AnswerValue {
    fn from(value: Vec<String>) -> Self {
        AnswerValue::MultiSelect(value)
    }
}

impl From<Vec<&str>> for AnswerValue {
    fn from(value: Vec<&str>) -> Self {
        AnswerValue::MultiSelect(value.into_iter().map(str::to_owned).collect())
    }
}

/// A patient's answers keyed by question identifier.
///
/// Iteration is in key order, which keeps tag extraction output deterministic.
pub type Answers = BTreeMap<String, AnswerValue>;

/// Parse answers from a JSON object such as `{"q1": "yes", "q2": ["a", "b"]}`.
pub fn answers_from_json(json: &str) -> crate::MatchingResult<Answers> {
    serde_json::from_str(json).map_err(crate::MatchingError::Deserialization)
}
