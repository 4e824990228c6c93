//! Diagnostic rule matching.
//!
//! A priority-ordered, first-match rule engine: at most one diagnostic applies to a patient.

use crate::tagging::AppliedTagSet;
use anamnese_types::{NonEmptyText, Tag};
use serde::{Deserialize, Serialize};

/// How a rule combines its activation tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TagLogic {
    /// Every activation tag must be applied.
    And,
    /// At least one activation tag must be applied.
    Or,
}

/// An administrator-authored diagnostic rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticRule {
    pub id: NonEmptyText,
    /// Human-readable diagnostic label.
    pub name: Option<NonEmptyText>,
    pub activation_tags: Vec<Tag>,
    pub tag_logic: TagLogic,
    pub is_active: bool,
    /// Lower values take precedence.
    pub priority: i64,
}

impl DiagnosticRule {
    /// Whether the rule's activation condition holds for `applied`.
    ///
    /// This ignores `is_active`. An `AND` rule with no activation tags is vacuously
    /// satisfied; an `OR` rule with no activation tags never is.
    pub fn is_satisfied_by(&self, applied: &AppliedTagSet) -> bool {
        match self.tag_logic {
            TagLogic::And => self
                .activation_tags
                .iter()
                .all(|tag| applied.contains(tag.as_str())),
            TagLogic::Or => self
                .activation_tags
                .iter()
                .any(|tag| applied.contains(tag.as_str())),
        }
    }
}

/// Select the highest-precedence active rule satisfied by `applied`.
///
/// Returns `None` when either input is empty or no active rule is satisfied. Rules with
/// equal priority are tried in input order.
pub fn find_matching_diagnostic_rule<'a>(
    rules: &'a [DiagnosticRule],
    applied: &AppliedTagSet,
) -> Option<&'a DiagnosticRule> {
    if rules.is_empty() || applied.is_empty() {
        return None;
    }

    let mut candidates: Vec<&DiagnosticRule> =
        rules.iter().filter(|rule| rule.is_active).collect();
    // sort_by_key is stable
    candidates.sort_by_key(|rule| rule.priority);

    let matched = candidates
        .into_iter()
        .find(|rule| rule.is_satisfied_by(applied));

    match matched {
        Some(rule) => {
            tracing::debug!(
                rule = %rule.id,
                priority = rule.priority,
                "diagnostic rule matched"
            );
        }
        None => tracing::debug!(rules = rules.len(), "no diagnostic rule matched"),
    }

    matched
}
