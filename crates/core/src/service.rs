//! Evaluation service.
//!
//! Runs the full pipeline for one patient: answers are tagged, then the applied tags select
//! a diagnostic and the matching treatment plans. The service owns a validated
//! [`MatchingConfig`] and holds no other state, so it can be shared across threads and
//! used for many patients concurrently.

use crate::answers::Answers;
use crate::diagnostics::{find_matching_diagnostic_rule, DiagnosticRule};
use crate::matching_config::MatchingConfig;
use crate::plans::{find_matching_plans, PlanRef};
use crate::store::{StoreKey, TagStore};
use crate::tagging::{extract_tags, AppliedTagSet};
use crate::MatchingResult;
use serde::Serialize;

/// Outcome of evaluating one patient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub tags: AppliedTagSet,
    pub diagnostic: Option<DiagnosticRule>,
    pub plans: Vec<PlanRef>,
}

/// Pure evaluation operations over a fixed matching configuration.
#[derive(Debug, Clone)]
pub struct EvaluationService {
    config: MatchingConfig,
}

impl EvaluationService {
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    pub fn extract_tags(&self, answers: &Answers) -> AppliedTagSet {
        extract_tags(answers, &self.config.question_mappings)
    }

    pub fn find_diagnostic(&self, applied: &AppliedTagSet) -> Option<&DiagnosticRule> {
        find_matching_diagnostic_rule(&self.config.diagnostic_rules, applied)
    }

    pub fn find_plans(&self, applied: &AppliedTagSet) -> Vec<&PlanRef> {
        find_matching_plans(&self.config.plans, applied)
    }

    /// Evaluate a patient's answers.
    pub fn evaluate(&self, answers: &Answers) -> Evaluation {
        let tags = self.extract_tags(answers);
        self.evaluate_tags(tags)
    }

    /// Evaluate an already-applied tag set.
    pub fn evaluate_tags(&self, tags: AppliedTagSet) -> Evaluation {
        let diagnostic = self.find_diagnostic(&tags).cloned();
        let plans: Vec<PlanRef> = self.find_plans(&tags).into_iter().cloned().collect();

        tracing::info!(
            tags = tags.len(),
            diagnostic = diagnostic.as_ref().map(|rule| rule.id.as_str()).unwrap_or("none"),
            plans = plans.len(),
            "evaluated patient"
        );

        Evaluation {
            tags,
            diagnostic,
            plans,
        }
    }

    /// Evaluate a patient's answers and persist the applied tags under `key`.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the store. The evaluation itself cannot fail.
    pub fn evaluate_and_store<S>(
        &self,
        answers: &Answers,
        store: &S,
        key: &StoreKey,
    ) -> MatchingResult<Evaluation>
    where
        S: TagStore + ?Sized,
    {
        let evaluation = self.evaluate(answers);
        store.set(key, evaluation.tags.as_slice())?;
        Ok(evaluation)
    }

    /// Re-evaluate diagnostics and plans from tags previously stored under `key`.
    ///
    /// A missing key evaluates as an empty tag set.
    pub fn evaluate_stored<S>(&self, store: &S, key: &StoreKey) -> MatchingResult<Evaluation>
    where
        S: TagStore + ?Sized,
    {
        let tags = match store.get(key)? {
            Some(tags) => AppliedTagSet::from(tags),
            None => {
                tracing::debug!(key = %key, "no stored tags found");
                AppliedTagSet::new()
            }
        };
        Ok(self.evaluate_tags(tags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::AnswerValue;
    use crate::store::InMemoryTagStore;
    use anamnese_types::Tag;

    const CONFIG: &str = r#"question_mappings:
  pattern:
    - value: crown
      tags: [androgenetic]
    - value: patches
      tags: [areata]
  family_history:
    - value: true
      tags: [hereditary]
diagnostic_rules:
  - id: aga-hereditary
    activation_tags: [androgenetic, hereditary]
    tag_logic: AND
    priority: 1
  - id: aga
    activation_tags: [androgenetic]
    tag_logic: OR
    priority: 2
plans:
  - plan_id: finasteride
    tags: [androgenetic]
  - plan_id: minoxidil
    tags: [androgenetic, areata]
  - plan_id: corticoid
    tags: [areata]
"#;

    fn service() -> EvaluationService {
        EvaluationService::new(MatchingConfig::from_yaml(CONFIG).expect("parse config"))
    }

    fn answers(pairs: &[(&str, AnswerValue)]) -> Answers {
        pairs
            .iter()
            .map(|(question, value)| (question.to_string(), value.clone()))
            .collect()
    }

    fn plan_ids(evaluation: &Evaluation) -> Vec<&str> {
        evaluation
            .plans
            .iter()
            .map(|plan| plan.plan_id.as_str())
            .collect()
    }

    #[test]
    fn evaluates_full_pipeline() {
        let evaluation = service().evaluate(&answers(&[
            ("pattern", AnswerValue::from("crown")),
            ("family_history", AnswerValue::from(true)),
        ]));

        assert!(evaluation.tags.contains("androgenetic"));
        assert!(evaluation.tags.contains("hereditary"));
        assert_eq!(
            evaluation.diagnostic.as_ref().map(|rule| rule.id.as_str()),
            Some("aga-hereditary")
        );
        assert_eq!(plan_ids(&evaluation), vec!["finasteride", "minoxidil"]);
    }

    #[test]
    fn falls_back_to_lower_precedence_diagnostic() {
        let evaluation = service().evaluate(&answers(&[
            ("pattern", AnswerValue::from("crown")),
            ("family_history", AnswerValue::from(false)),
        ]));

        assert_eq!(
            evaluation.diagnostic.as_ref().map(|rule| rule.id.as_str()),
            Some("aga")
        );
    }

    #[test]
    fn no_answers_yield_empty_evaluation() {
        let evaluation = service().evaluate(&Answers::new());
        assert!(evaluation.tags.is_empty());
        assert!(evaluation.diagnostic.is_none());
        assert!(evaluation.plans.is_empty());
    }

    #[test]
    fn stores_and_reevaluates_tags() {
        let service = service();
        let store = InMemoryTagStore::new();
        let key = StoreKey::in_default_namespace("patient-7").expect("valid key");

        let evaluation = service
            .evaluate_and_store(
                &answers(&[("pattern", AnswerValue::from("patches"))]),
                &store,
                &key,
            )
            .expect("evaluate and store");

        assert_eq!(
            store.get(&key).expect("get"),
            Some(vec![Tag::from("areata")])
        );

        let again = service.evaluate_stored(&store, &key).expect("evaluate stored");
        assert_eq!(again, evaluation);
        assert_eq!(plan_ids(&again), vec!["minoxidil", "corticoid"]);
        assert!(again.diagnostic.is_none());
    }

    #[test]
    fn missing_stored_tags_evaluate_empty() {
        let store = InMemoryTagStore::new();
        let key = StoreKey::in_default_namespace("unknown").expect("valid key");

        let evaluation = service()
            .evaluate_stored(&store, &key)
            .expect("evaluate stored");
        assert!(evaluation.tags.is_empty());
        assert!(evaluation.plans.is_empty());
    }

    #[test]
    fn evaluation_serialises_to_json() {
        let evaluation = service().evaluate(&answers(&[("pattern", AnswerValue::from("crown"))]));
        let json = serde_json::to_value(&evaluation).expect("serialise evaluation");

        assert_eq!(json["tags"], serde_json::json!(["androgenetic"]));
        assert_eq!(json["diagnostic"]["id"], "aga");
        assert_eq!(json["diagnostic"]["tag_logic"], "OR");
        assert_eq!(json["plans"][0]["plan_id"], "finasteride");
    }
}
