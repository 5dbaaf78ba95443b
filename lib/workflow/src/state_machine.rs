//! Design-time workflow definitions.
//!
//! A workflow definition is a state machine over an entity type: named
//! states with edit/validation rules, and guarded transitions between them.
//! It is authored by administrators or drafted by the proposal orchestrator
//! and is distinct from the trigger-to-actions automation [`Workflow`].
//!
//! [`Workflow`]: crate::definition::Workflow

use chrono::{DateTime, Utc};
use ruleflow_core::{DefinitionId, TenantId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default display color of a state.
pub const DEFAULT_STATE_COLOR: &str = "#64748b";

/// Entity types a definition can govern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Entity,
    Equipment,
    User,
}

impl EntityType {
    /// Returns the wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entity => "ENTITY",
            Self::Equipment => "EQUIPMENT",
            Self::User => "USER",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ENTITY" => Ok(Self::Entity),
            "EQUIPMENT" => Ok(Self::Equipment),
            "USER" => Ok(Self::User),
            other => Err(format!("unknown entity type: {other}")),
        }
    }
}

/// Publication status of a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionStatus {
    #[default]
    Draft,
    Published,
}

/// Deployment environment of a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Environment {
    #[default]
    Production,
    Sandbox,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => f.write_str("PRODUCTION"),
            Self::Sandbox => f.write_str("SANDBOX"),
        }
    }
}

/// Who decides that a transition is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionStrategy {
    #[default]
    User,
}

/// A state of the machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub id: String,
    pub label: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub is_initial: bool,
    #[serde(default)]
    pub is_final: bool,
    pub can_edit: bool,
    pub requires_validation: bool,
    pub roles_allowed: Vec<String>,
}

impl State {
    /// Creates a state with default presentation and permissions.
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            color: DEFAULT_STATE_COLOR.to_string(),
            icon: None,
            is_initial: false,
            is_final: false,
            can_edit: true,
            requires_validation: false,
            roles_allowed: default_state_roles(),
        }
    }

    /// Marks the state as final.
    #[must_use]
    pub fn final_state(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// Returns true if `reference` names this state by id or label.
    #[must_use]
    pub fn is_named(&self, reference: &str) -> bool {
        self.id == reference || self.label == reference
    }
}

/// Roles allowed in a state when none are specified.
#[must_use]
pub fn default_state_roles() -> Vec<String> {
    vec!["ADMIN".to_string(), "TECHNICAL".to_string()]
}

/// Roles required for a transition when none are specified.
#[must_use]
pub fn default_transition_roles() -> Vec<String> {
    vec!["ADMIN".to_string()]
}

/// Guards that must hold before a transition may be taken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionConditions {
    pub checklist_complete: bool,
    pub min_documents: i64,
    pub require_signature: bool,
    pub require_comment: bool,
}

/// A guarded edge between two states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub label: String,
    pub required_role: Vec<String>,
    #[serde(rename = "decisionStrategy", default)]
    pub decision_strategy: DecisionStrategy,
    pub probability: f64,
    #[serde(default)]
    pub conditions: TransitionConditions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
}

impl Transition {
    /// Creates a user-decided transition with default guards.
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            label: label.into(),
            required_role: default_transition_roles(),
            decision_strategy: DecisionStrategy::User,
            probability: 1.0,
            conditions: TransitionConditions::default(),
            actions: None,
        }
    }
}

/// A design-time state machine for one entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub id: DefinitionId,
    #[serde(rename = "tenantId")]
    pub tenant_id: TenantId,
    pub industry: String,
    pub name: String,
    #[serde(rename = "entityType")]
    pub entity_type: EntityType,
    pub states: Vec<State>,
    pub transitions: Vec<Transition>,
    pub initial_state: String,
    pub is_default: bool,
    pub active: bool,
    pub status: DefinitionStatus,
    pub environment: Environment,
    pub version: u32,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl WorkflowDefinition {
    /// Creates an empty, inactive draft at version 1.
    #[must_use]
    pub fn draft(
        tenant_id: TenantId,
        industry: impl Into<String>,
        name: impl Into<String>,
        entity_type: EntityType,
        initial_state: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: DefinitionId::new(),
            tenant_id,
            industry: industry.into(),
            name: name.into(),
            entity_type,
            states: Vec::new(),
            transitions: Vec::new(),
            initial_state: initial_state.into(),
            is_default: false,
            active: false,
            status: DefinitionStatus::Draft,
            environment: Environment::Production,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends a state.
    #[must_use]
    pub fn with_state(mut self, state: State) -> Self {
        self.states.push(state);
        self
    }

    /// Appends a transition.
    #[must_use]
    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Finds a state by id or label.
    #[must_use]
    pub fn state(&self, reference: &str) -> Option<&State> {
        self.states.iter().find(|s| s.is_named(reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WorkflowDefinition {
        WorkflowDefinition::draft(
            TenantId::new("acme"),
            "ELEVATORS",
            "Inspection",
            EntityType::Equipment,
            "open",
        )
        .with_state(State::new("open", "Open"))
        .with_state(State::new("closed", "Closed").final_state())
        .with_transition(Transition::new("open", "closed", "Close"))
    }

    #[test]
    fn draft_defaults() {
        let def = sample();
        assert_eq!(def.status, DefinitionStatus::Draft);
        assert!(!def.active);
        assert_eq!(def.version, 1);
        assert_eq!(def.environment, Environment::Production);
    }

    #[test]
    fn state_lookup_by_id_or_label() {
        let def = sample();
        assert!(def.state("open").is_some());
        assert!(def.state("Closed").is_some());
        assert!(def.state("archived").is_none());
    }

    #[test]
    fn definition_wire_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["entityType"], "EQUIPMENT");
        assert_eq!(json["initial_state"], "open");
        assert_eq!(json["status"], "draft");
        assert_eq!(json["transitions"][0]["decisionStrategy"], "USER");
        assert_eq!(json["transitions"][0]["probability"], 1.0);
        assert_eq!(json["states"][0]["color"], DEFAULT_STATE_COLOR);
        assert_eq!(json["states"][0]["roles_allowed"][1], "TECHNICAL");
    }

    #[test]
    fn entity_type_parses_case_insensitively() {
        assert_eq!("equipment".parse::<EntityType>(), Ok(EntityType::Equipment));
        assert!("vehicle".parse::<EntityType>().is_err());
    }
}
