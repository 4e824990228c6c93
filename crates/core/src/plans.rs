//! Treatment plan matching.
//!
//! Unlike diagnostics, plans are independent offerings: a patient may qualify for several.

use crate::tagging::AppliedTagSet;
use anamnese_types::{NonEmptyText, Tag};
use serde::Serialize;

/// A treatment plan and the tags that qualify a patient for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanRef {
    pub plan_id: NonEmptyText,
    pub name: Option<NonEmptyText>,
    pub tags: Vec<Tag>,
}

impl PlanRef {
    /// The plan's tags that are present in `applied`, in plan order.
    pub fn matched_tags<'a>(&'a self, applied: &AppliedTagSet) -> Vec<&'a Tag> {
        self.tags
            .iter()
            .filter(|tag| applied.contains(tag.as_str()))
            .collect()
    }

    pub fn is_matched_by(&self, applied: &AppliedTagSet) -> bool {
        self.tags.iter().any(|tag| applied.contains(tag.as_str()))
    }
}

/// Every plan sharing at least one tag with `applied`, in input order.
pub fn find_matching_plans<'a>(plans: &'a [PlanRef], applied: &AppliedTagSet) -> Vec<&'a PlanRef> {
    if plans.is_empty() || applied.is_empty() {
        return Vec::new();
    }

    let matched: Vec<&PlanRef> = plans
        .iter()
        .filter(|plan| plan.is_matched_by(applied))
        .collect();

    tracing::debug!(
        plans = plans.len(),
        matched = matched.len(),
        "matched treatment plans"
    );
    matched
}
