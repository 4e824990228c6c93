//! # Anamnese Core
//!
//! Rule evaluation behind the medical intake questionnaire ("anamnese").
//!
//! A patient's answers flow through three stateless stages:
//! - **Tagging**: answers are mapped to a deduplicated set of tags ([`extract_tags`])
//! - **Diagnostics**: the tags select at most one prioritised diagnostic rule
//!   ([`find_matching_diagnostic_rule`])
//! - **Plans**: the tags select every treatment plan sharing a tag ([`find_matching_plans`])
//!
//! The evaluators are pure functions and never fail: missing mappings, empty inputs and
//! mismatched answer shapes simply produce no tags or no match. Errors exist only around
//! them, when loading the matching configuration or persisting tags through a [`TagStore`].
//!
//! **No UI or transport concerns**: collecting answers and authoring rules happen elsewhere.

pub mod answers;
pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod error;
pub mod matching_config;
pub mod plans;
pub mod service;
pub mod store;
pub mod tagging;
pub mod validation;

pub use answers::{answers_from_json, AnswerValue, Answers};
pub use config::CoreConfig;
pub use diagnostics::{find_matching_diagnostic_rule, DiagnosticRule, TagLogic};
pub use error::{MatchingError, MatchingResult};
pub use matching_config::MatchingConfig;
pub use plans::{find_matching_plans, PlanRef};
pub use service::{Evaluation, EvaluationService};
pub use store::{FileTagStore, InMemoryTagStore, StoreKey, TagRecord, TagStore};
pub use tagging::{extract_tags, AppliedTagSet, QuestionTagMappings, TagMappingRule};

pub use anamnese_types::{NonEmptyText, Tag};
