//! Schemas for model output.
//!
//! The model answers with loosely-typed JSON. These types decode it and
//! enforce the constraints serde alone cannot express.

use crate::error::ProposalError;
use ruleflow_workflow::EntityType;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// What the router recommends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuggestionAction {
    /// Reuse one of the tenant's existing definitions.
    UseExisting,
    /// Draft a new definition.
    ProposeNew,
}

/// Router answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub action: SuggestionAction,
    /// Definition to reuse. Required for [`SuggestionAction::UseExisting`].
    #[serde(
        rename = "workflowId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub workflow_id: Option<String>,
    #[serde(default)]
    pub reason: String,
    /// Confidence in `[0, 1]`, rounded to two decimals.
    pub confidence: f64,
}

fn invalid(details: impl Into<String>) -> ProposalError {
    ProposalError::InvalidOutput {
        details: details.into(),
    }
}

impl Suggestion {
    /// Decodes and checks a router answer.
    ///
    /// # Errors
    ///
    /// Returns [`ProposalError::InvalidOutput`] if the value does not match
    /// the schema, the confidence is outside `[0, 1]`, or a reuse answer
    /// names no workflow.
    pub fn from_value(value: JsonValue) -> Result<Self, ProposalError> {
        let mut suggestion: Self =
            serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;

        if !suggestion.confidence.is_finite() || !(0.0..=1.0).contains(&suggestion.confidence) {
            return Err(invalid(format!(
                "confidence {} is outside [0, 1]",
                suggestion.confidence
            )));
        }
        suggestion.confidence = (suggestion.confidence * 100.0).round() / 100.0;

        if suggestion.action == SuggestionAction::UseExisting
            && suggestion
                .workflow_id
                .as_deref()
                .is_none_or(|id| id.trim().is_empty())
        {
            return Err(invalid("USE_EXISTING requires a workflowId"));
        }

        Ok(suggestion)
    }
}

/// A state as proposed by the model; unset fields take defaults on assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedState {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub is_initial: bool,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub can_edit: Option<bool>,
    #[serde(default)]
    pub requires_validation: Option<bool>,
    #[serde(default)]
    pub roles_allowed: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposedConditions {
    #[serde(default)]
    pub checklist_complete: Option<bool>,
    #[serde(default)]
    pub min_documents: Option<i64>,
    #[serde(default)]
    pub require_signature: Option<bool>,
    #[serde(default)]
    pub require_comment: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedTransition {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub required_role: Option<Vec<String>>,
    #[serde(default)]
    pub conditions: Option<ProposedConditions>,
    #[serde(default)]
    pub actions: Option<Vec<String>>,
}

/// Generator answer: a state machine sketch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub name: String,
    #[serde(rename = "entityType")]
    pub entity_type: EntityType,
    pub states: Vec<ProposedState>,
    #[serde(default)]
    pub transitions: Vec<ProposedTransition>,
    pub initial_state: String,
}

impl Proposal {
    /// Decodes a generator answer.
    ///
    /// Cross-references between states and transitions are not checked here;
    /// that is the structural validator's job.
    ///
    /// # Errors
    ///
    /// Returns [`ProposalError::InvalidOutput`] if the value does not match
    /// the schema.
    pub fn from_value(value: JsonValue) -> Result<Self, ProposalError> {
        serde_json::from_value(value).map_err(|e| invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn confidence_is_rounded() {
        let suggestion = Suggestion::from_value(json!({
            "action": "PROPOSE_NEW",
            "reason": "nothing similar",
            "confidence": 0.876
        }))
        .unwrap();
        assert_eq!(suggestion.action, SuggestionAction::ProposeNew);
        assert!((suggestion.confidence - 0.88).abs() < f64::EPSILON);
    }

    #[test]
    fn confidence_out_of_range_is_rejected() {
        let err = Suggestion::from_value(json!({
            "action": "PROPOSE_NEW",
            "confidence": 1.5
        }))
        .unwrap_err();
        assert!(err.to_string().contains("outside [0, 1]"));
    }

    #[test]
    fn reuse_requires_workflow_id() {
        let err = Suggestion::from_value(json!({
            "action": "USE_EXISTING",
            "reason": "close match",
            "confidence": 0.9
        }))
        .unwrap_err();
        assert!(err.to_string().contains("workflowId"));

        let ok = Suggestion::from_value(json!({
            "action": "USE_EXISTING",
            "workflowId": "wfd_01",
            "confidence": 0.9
        }))
        .unwrap();
        assert_eq!(ok.workflow_id.as_deref(), Some("wfd_01"));
    }

    #[test]
    fn unknown_action_is_rejected() {
        let err = Suggestion::from_value(json!({"action": "MAYBE", "confidence": 0.5}));
        assert!(err.is_err());
    }

    #[test]
    fn proposal_decodes_with_optional_fields_missing() {
        let proposal = Proposal::from_value(json!({
            "name": "Elevator inspection",
            "entityType": "EQUIPMENT",
            "states": [
                {"id": "scheduled", "label": "Scheduled", "is_initial": true},
                {"id": "done", "label": "Done", "is_final": true, "color": "#16a34a"}
            ],
            "transitions": [
                {"from": "scheduled", "to": "done", "label": "Complete",
                 "conditions": {"min_documents": 2}}
            ],
            "initial_state": "scheduled"
        }))
        .unwrap();

        assert_eq!(proposal.entity_type, EntityType::Equipment);
        assert_eq!(proposal.states[0].color, None);
        assert_eq!(proposal.states[1].color.as_deref(), Some("#16a34a"));
        let conditions = proposal.transitions[0].conditions.as_ref().unwrap();
        assert_eq!(conditions.min_documents, Some(2));
        assert_eq!(conditions.require_signature, None);
    }

    #[test]
    fn proposal_with_unknown_entity_type_is_rejected() {
        let err = Proposal::from_value(json!({
            "name": "x",
            "entityType": "VEHICLE",
            "states": [],
            "initial_state": "a"
        }))
        .unwrap_err();
        assert!(matches!(err, ProposalError::InvalidOutput { .. }));
    }
}
