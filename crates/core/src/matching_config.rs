//! Matching configuration document.
//!
//! The configuration bundles everything the evaluators need besides the patient's answers:
//! tag mapping rules per question, diagnostic rules and treatment plans. It is authored
//! outside this crate (typically exported from the admin tooling) as YAML or JSON.
//!
//! Parsing goes through strict wire structs (`deny_unknown_fields`) and
//! `serde_path_to_error`, so a schema mismatch names the failing field. The wire form is
//! then translated into domain types, validating identifiers and tags on the way.
//!
//! ```yaml
//! question_mappings:
//!   hair_loss_pattern:
//!     - value: crown
//!       tags: [androgenetic]
//! diagnostic_rules:
//!   - id: aga-moderate
//!     activation_tags: [androgenetic]
//!     tag_logic: OR
//!     priority: 1
//! plans:
//!   - plan_id: finasteride-oral
//!     tags: [androgenetic]
//! ```

use crate::answers::AnswerValue;
use crate::diagnostics::{DiagnosticRule, TagLogic};
use crate::plans::PlanRef;
use crate::tagging::{QuestionTagMappings, TagMappingRule};
use crate::{MatchingError, MatchingResult};
use anamnese_types::{NonEmptyText, Tag};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

// ============================================================================
// Public domain-level types
// ============================================================================

/// Validated matching configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchingConfig {
    pub question_mappings: QuestionTagMappings,
    pub diagnostic_rules: Vec<DiagnosticRule>,
    pub plans: Vec<PlanRef>,
}

impl MatchingConfig {
    /// Parse a matching configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`MatchingError::ConfigSchema`] if the YAML does not match the wire schema
    /// (unknown keys, wrong types, missing fields), or [`MatchingError::InvalidConfig`] if
    /// identifiers or tags fail validation.
    pub fn from_yaml(yaml_text: &str) -> MatchingResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        let wire = deserialize_wire(deserializer)?;
        wire_to_domain(wire)
    }

    /// Parse a matching configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Same as [`MatchingConfig::from_yaml`].
    pub fn from_json(json_text: &str) -> MatchingResult<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);
        let wire = deserialize_wire(&mut deserializer)?;
        deserializer.end().map_err(MatchingError::Deserialization)?;
        wire_to_domain(wire)
    }

    /// Load a matching configuration from a file, choosing the format by extension.
    pub fn from_path(path: &Path) -> MatchingResult<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let parse: fn(&str) -> MatchingResult<Self> = match extension.as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml,
            Some("json") => Self::from_json,
            _ => {
                return Err(MatchingError::UnsupportedConfigFormat {
                    path: path.to_path_buf(),
                })
            }
        };

        let contents = std::fs::read_to_string(path).map_err(MatchingError::FileRead)?;
        let config = parse(&contents)?;

        tracing::info!(
            path = %path.display(),
            questions = config.question_mappings.len(),
            diagnostic_rules = config.diagnostic_rules.len(),
            plans = config.plans.len(),
            "loaded matching configuration"
        );
        Ok(config)
    }

    /// Render the configuration as YAML text.
    pub fn render_yaml(&self) -> MatchingResult<String> {
        let wire = domain_to_wire(self);
        serde_yaml::to_string(&wire).map_err(MatchingError::YamlSerialization)
    }

    /// Number of diagnostic rules that can currently fire.
    pub fn active_rule_count(&self) -> usize {
        self.diagnostic_rules
            .iter()
            .filter(|rule| rule.is_active)
            .count()
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct MatchingConfigWire {
    #[serde(default)]
    question_mappings: BTreeMap<String, Vec<TagMappingRuleWire>>,
    #[serde(default)]
    diagnostic_rules: Vec<DiagnosticRuleWire>,
    #[serde(default)]
    plans: Vec<PlanWire>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct TagMappingRuleWire {
    value: AnswerValue,
    tags: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct DiagnosticRuleWire {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    activation_tags: Vec<String>,
    tag_logic: TagLogic,
    #[serde(default = "default_is_active")]
    is_active: bool,
    priority: i64,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct PlanWire {
    plan_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    tags: Vec<String>,
}

fn default_is_active() -> bool {
    true
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn deserialize_wire<'de, D>(deserializer: D) -> MatchingResult<MatchingConfigWire>
where
    D: serde::Deserializer<'de>,
    D::Error: std::fmt::Display,
{
    serde_path_to_error::deserialize::<_, MatchingConfigWire>(deserializer).map_err(|err| {
        let path = err.path().to_string();
        let message = err.into_inner().to_string();
        let path = if path.is_empty() {
            "<root>".to_owned()
        } else {
            path
        };
        MatchingError::ConfigSchema { path, message }
    })
}

fn identifier(field: &str, value: &str) -> MatchingResult<NonEmptyText> {
    NonEmptyText::new(value)
        .map_err(|_| MatchingError::InvalidConfig(format!("{field} cannot be empty")))
}

fn optional_name(field: &str, value: Option<String>) -> MatchingResult<Option<NonEmptyText>> {
    value.map(|name| identifier(field, &name)).transpose()
}

/// Tags are opaque, so they are kept verbatim; only the empty string is rejected.
fn tags(field: &str, values: Vec<String>) -> MatchingResult<Vec<Tag>> {
    values
        .into_iter()
        .map(|value| {
            if value.is_empty() {
                Err(MatchingError::InvalidConfig(format!(
                    "{field} contains an empty tag"
                )))
            } else {
                Ok(Tag::new(value))
            }
        })
        .collect()
}

fn wire_to_domain(wire: MatchingConfigWire) -> MatchingResult<MatchingConfig> {
    let mut question_mappings = QuestionTagMappings::new();
    for (question_id, rules) in wire.question_mappings {
        if question_id.trim().is_empty() {
            return Err(MatchingError::InvalidConfig(
                "question identifier cannot be empty".into(),
            ));
        }

        let field = format!("question_mappings.{question_id}");
        let rules = rules
            .into_iter()
            .map(|rule| -> MatchingResult<TagMappingRule> {
                Ok(TagMappingRule {
                    value: rule.value,
                    tags: tags(&field, rule.tags)?,
                })
            })
            .collect::<MatchingResult<Vec<_>>>()?;
        question_mappings.insert(question_id, rules);
    }

    let mut rule_ids = HashSet::new();
    let mut diagnostic_rules = Vec::with_capacity(wire.diagnostic_rules.len());
    for rule in wire.diagnostic_rules {
        let id = identifier("diagnostic rule id", &rule.id)?;
        if !rule_ids.insert(id.clone()) {
            return Err(MatchingError::InvalidConfig(format!(
                "duplicate diagnostic rule id: {id}"
            )));
        }

        let field = format!("diagnostic rule {id}");
        let activation_tags = tags(&field, rule.activation_tags)?;
        if activation_tags.is_empty() {
            tracing::warn!(
                rule = %id,
                tag_logic = ?rule.tag_logic,
                "diagnostic rule has no activation tags"
            );
        }

        diagnostic_rules.push(DiagnosticRule {
            name: optional_name("diagnostic rule name", rule.name)?,
            id,
            activation_tags,
            tag_logic: rule.tag_logic,
            is_active: rule.is_active,
            priority: rule.priority,
        });
    }

    let mut plan_ids = HashSet::new();
    let mut plans = Vec::with_capacity(wire.plans.len());
    for plan in wire.plans {
        let plan_id = identifier("plan id", &plan.plan_id)?;
        if !plan_ids.insert(plan_id.clone()) {
            return Err(MatchingError::InvalidConfig(format!(
                "duplicate plan id: {plan_id}"
            )));
        }

        let field = format!("plan {plan_id}");
        let plan_tags = tags(&field, plan.tags)?;
        if plan_tags.is_empty() {
            tracing::warn!(plan = %plan_id, "plan has no tags and can never match");
        }

        plans.push(PlanRef {
            name: optional_name("plan name", plan.name)?,
            plan_id,
            tags: plan_tags,
        });
    }

    Ok(MatchingConfig {
        question_mappings,
        diagnostic_rules,
        plans,
    })
}

fn tag_strings(tags: &[Tag]) -> Vec<String> {
    tags.iter().map(|tag| tag.as_str().to_owned()).collect()
}

fn domain_to_wire(config: &MatchingConfig) -> MatchingConfigWire {
    MatchingConfigWire {
        question_mappings: config
            .question_mappings
            .iter()
            .map(|(question_id, rules)| {
                let rules = rules
                    .iter()
                    .map(|rule| TagMappingRuleWire {
                        value: rule.value.clone(),
                        tags: tag_strings(&rule.tags),
                    })
                    .collect();
                (question_id.clone(), rules)
            })
            .collect(),
        diagnostic_rules: config
            .diagnostic_rules
            .iter()
            .map(|rule| DiagnosticRuleWire {
                id: rule.id.to_string(),
                name: rule.name.as_ref().map(ToString::to_string),
                activation_tags: tag_strings(&rule.activation_tags),
                tag_logic: rule.tag_logic,
                is_active: rule.is_active,
                priority: rule.priority,
            })
            .collect(),
        plans: config
            .plans
            .iter()
            .map(|plan| PlanWire {
                plan_id: plan.plan_id.to_string(),
                name: plan.name.as_ref().map(ToString::to_string),
                tags: tag_strings(&plan.tags),
            })
            .collect(),
    }
}
