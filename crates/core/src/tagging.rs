//! Answer tagging.
//!
//! Converts a patient's answers into the deduplicated set of tags that drives diagnostic
//! and plan matching.

use crate::answers::{AnswerValue, Answers};
use anamnese_types::Tag;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Emits `tags` when a question's answer equals `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagMappingRule {
    pub value: AnswerValue,
    pub tags: Vec<Tag>,
}

/// Tag mapping rules keyed by question identifier.
///
/// A question without an entry here contributes no tags, whatever its answer.
pub type QuestionTagMappings = BTreeMap<String, Vec<TagMappingRule>>;

/// The tags applied to one patient.
///
/// Tags keep the order in which they were first added and never appear twice. Equality
/// compares membership only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Tag>", into = "Vec<Tag>")]
pub struct AppliedTagSet {
    tags: Vec<Tag>,
    seen: HashSet<Tag>,
}

impl AppliedTagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tag, returning `false` if it was already present.
    pub fn insert(&mut self, tag: Tag) -> bool {
        if self.seen.contains(&tag) {
            return false;
        }
        self.seen.insert(tag.clone());
        self.tags.push(tag);
        true
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.seen.contains(tag)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.tags.iter()
    }

    pub fn as_slice(&self) -> &[Tag] {
        &self.tags
    }
}

impl PartialEq for AppliedTagSet {
    fn eq(&self, other: &Self) -> bool {
        self.seen == other.seen
    }
}

impl Eq for AppliedTagSet {}

impl Extend<Tag> for AppliedTagSet {
    fn extend<I: IntoIterator<Item = Tag>>(&mut self, iter: I) {
        for tag in iter {
            self.insert(tag);
        }
    }
}

impl FromIterator<Tag> for AppliedTagSet {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl From<Vec<Tag>> for AppliedTagSet {
    fn from(tags: Vec<Tag>) -> Self {
        tags.into_iter().collect()
    }
}

impl From<AppliedTagSet> for Vec<Tag> {
    fn from(set: AppliedTagSet) -> Self {
        set.tags
    }
}

impl<'a> IntoIterator for &'a AppliedTagSet {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}

/// Extract the applied tag set from a patient's answers.
///
/// For every answered question with mapping rules, each rule whose value matches the
/// answer contributes all of its tags. Answers to unmapped questions and mappings for
/// unanswered questions are ignored.
pub fn extract_tags(answers: &Answers, mappings: &QuestionTagMappings) -> AppliedTagSet {
    let mut applied = AppliedTagSet::new();

    for (question_id, answer) in answers {
        let Some(rules) = mappings.get(question_id) else {
            continue;
        };

        for rule in rules.iter().filter(|rule| rule.value.matches(answer)) {
            tracing::trace!(
                question = %question_id,
                kind = answer.kind(),
                tags = rule.tags.len(),
                "answer matched tag mapping rule"
            );
            applied.extend(rule.tags.iter().cloned());
        }
    }

    tracing::debug!(
        answers = answers.len(),
        tags = applied.len(),
        "extracted tags from answers"
    );
    applied
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(value: impl Into<AnswerValue>, tags: &[&str]) -> TagMappingRule {
        TagMappingRule {
            value: value.into(),
            tags: tags.iter().copied().map(Tag::from).collect(),
        }
    }

    fn tags(set: &AppliedTagSet) -> Vec<&str> {
        set.iter().map(Tag::as_str).collect()
    }

    #[test]
    fn empty_inputs_yield_empty_set() {
        let applied = extract_tags(&Answers::new(), &QuestionTagMappings::new());
        assert!(applied.is_empty());
    }

    #[test]
    fn collects_tags_from_every_matching_rule() {
        let mut mappings = QuestionTagMappings::new();
        mappings.insert(
            "pattern".into(),
            vec![
                rule("crown", &["androgenetic"]),
                rule("crown", &["crown_thinning"]),
                rule("temples", &["receding"]),
            ],
        );

        let mut answers = Answers::new();
        answers.insert("pattern".into(), "crown".into());

        let applied = extract_tags(&answers, &mappings);
        assert_eq!(tags(&applied), vec!["androgenetic", "crown_thinning"]);
    }

    #[test]
    fn deduplicates_across_questions() {
        let mut mappings = QuestionTagMappings::new();
        mappings.insert("q1".into(), vec![rule("yes", &["x", "x"])]);
        mappings.insert("q2".into(), vec![rule(true, &["x", "y"])]);

        let mut answers = Answers::new();
        answers.insert("q1".into(), "yes".into());
        answers.insert("q2".into(), true.into());

        let applied = extract_tags(&answers, &mappings);
        assert_eq!(tags(&applied), vec!["x", "y"]);
    }

    #[test]
    fn ignores_unmapped_and_unanswered_questions() {
        let mut mappings = QuestionTagMappings::new();
        mappings.insert("mapped".into(), vec![rule("a", &["tag_a"])]);
        mappings.insert("unanswered".into(), vec![rule("b", &["tag_b"])]);

        let mut answers = Answers::new();
        answers.insert("mapped".into(), "a".into());
        answers.insert("free_text".into(), "anything".into());

        let applied = extract_tags(&answers, &mappings);
        assert_eq!(tags(&applied), vec!["tag_a"]);
    }

    #[test]
    fn multi_select_matches_only_identical_order() {
        let mut mappings = QuestionTagMappings::new();
        mappings.insert(
            "areas".into(),
            vec![rule(vec!["opt1", "opt2"], &["both_areas"])],
        );

        let mut answers = Answers::new();
        answers.insert("areas".into(), vec!["opt1", "opt2"].into());
        assert_eq!(tags(&extract_tags(&answers, &mappings)), vec!["both_areas"]);

        answers.insert("areas".into(), vec!["opt2", "opt1"].into());
        assert!(extract_tags(&answers, &mappings).is_empty());
    }

    #[test]
    fn scalar_rule_does_not_match_multi_select_answer() {
        let mut mappings = QuestionTagMappings::new();
        mappings.insert("areas".into(), vec![rule("opt1", &["single"])]);

        let mut answers = Answers::new();
        answers.insert("areas".into(), vec!["opt1"].into());

        assert!(extract_tags(&answers, &mappings).is_empty());
    }

    #[test]
    fn extraction_is_idempotent() {
        let mut mappings = QuestionTagMappings::new();
        mappings.insert("q1".into(), vec![rule("a", &["x", "y"])]);
        mappings.insert("q2".into(), vec![rule(AnswerValue::Number(2.0), &["z"])]);

        let mut answers = Answers::new();
        answers.insert("q1".into(), "a".into());
        answers.insert("q2".into(), AnswerValue::Number(2.0));

        assert_eq!(
            extract_tags(&answers, &mappings),
            extract_tags(&answers, &mappings)
        );
    }

    #[test]
    fn applied_set_equality_ignores_order() {
        let a: AppliedTagSet = vec![Tag::from("x"), Tag::from("y")].into();
        let b: AppliedTagSet = vec![Tag::from("y"), Tag::from("x"), Tag::from("y")].into();
        assert_eq!(a, b);
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn applied_set_serialises_as_list() {
        let set: AppliedTagSet = vec![Tag::from("b"), Tag::from("a"), Tag::from("b")].into();
        let json = serde_json::to_string(&set).expect("serialise set");
        assert_eq!(json, r#"["b","a"]"#);

        let back: AppliedTagSet = serde_json::from_str(r#"["a","a","c"]"#).expect("parse set");
        assert_eq!(back.len(), 2);
        assert!(back.contains("a"));
        assert!(back.contains("c"));
    }
}
