//! Structural validation of workflow definitions.

use crate::state_machine::WorkflowDefinition;
use async_trait::async_trait;
use ruleflow_core::{CorrelationId, TenantId};
use std::collections::{HashSet, VecDeque};

/// Who asked for a validation, for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationContext {
    pub tenant_id: TenantId,
    pub correlation_id: CorrelationId,
}

impl ValidationContext {
    #[must_use]
    pub fn new(tenant_id: TenantId, correlation_id: CorrelationId) -> Self {
        Self {
            tenant_id,
            correlation_id,
        }
    }
}

/// Findings of a validation pass.
///
/// Errors make a definition unusable; warnings are advisory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Returns true if no errors were found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, message: String) {
        self.errors.push(message);
    }

    fn warning(&mut self, message: String) {
        self.warnings.push(message);
    }
}

/// Checks a definition before it is handed back to an administrator.
#[async_trait]
pub trait DefinitionValidator: Send + Sync {
    /// Validates a definition and reports every problem found.
    async fn validate(
        &self,
        definition: &WorkflowDefinition,
        context: &ValidationContext,
    ) -> ValidationReport;
}

/// Graph-level checks on states and transitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralValidator;

impl StructuralValidator {
    /// Runs every structural check synchronously.
    #[must_use]
    pub fn check(definition: &WorkflowDefinition) -> ValidationReport {
        let mut report = ValidationReport::default();

        if definition.name.trim().is_empty() {
            report.error("Workflow name must not be empty".to_string());
        }

        if definition.states.is_empty() {
            report.error("Workflow must declare at least one state".to_string());
            return report;
        }

        let mut seen = HashSet::new();
        for state in &definition.states {
            if !seen.insert(state.id.as_str()) {
                report.error(format!("Duplicate state id: {}", state.id));
            }
        }

        if definition.state(&definition.initial_state).is_none() {
            report.error(format!(
                "Initial state '{}' does not match any declared state",
                definition.initial_state
            ));
        }

        for (index, transition) in definition.transitions.iter().enumerate() {
            if definition.state(&transition.from).is_none() {
                report.error(format!(
                    "Transition {index} references unknown source state '{}'",
                    transition.from
                ));
            }
            if definition.state(&transition.to).is_none() {
                report.error(format!(
                    "Transition {index} references unknown target state '{}'",
                    transition.to
                ));
            }
            if transition.conditions.min_documents < 0 {
                report.warning(format!(
                    "Transition {index} requires a negative number of documents"
                ));
            }
        }

        if !definition.states.iter().any(|s| s.is_final) {
            report.warning("Workflow has no final state".to_string());
        }

        if let Some(initial) = definition.state(&definition.initial_state) {
            let reachable = reachable_from(definition, &initial.id);
            for state in &definition.states {
                if !reachable.contains(state.id.as_str()) {
                    report.warning(format!(
                        "State '{}' is unreachable from the initial state",
                        state.id
                    ));
                }
            }
        }

        report
    }
}

#[async_trait]
impl DefinitionValidator for StructuralValidator {
    async fn validate(
        &self,
        definition: &WorkflowDefinition,
        context: &ValidationContext,
    ) -> ValidationReport {
        let report = Self::check(definition);
        tracing::debug!(
            tenant_id = %context.tenant_id,
            correlation_id = %context.correlation_id,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "validated workflow definition"
        );
        report
    }
}

/// Breadth-first walk over transitions, resolving references by id or label.
fn reachable_from<'a>(definition: &'a WorkflowDefinition, start: &'a str) -> HashSet<&'a str> {
    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        for transition in &definition.transitions {
            let Some(from) = definition.state(&transition.from) else {
                continue;
            };
            if from.id != current {
                continue;
            }
            if let Some(to) = definition.state(&transition.to)
                && visited.insert(to.id.as_str())
            {
                queue.push_back(to.id.as_str());
            }
        }
    }

    visited
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::{EntityType, State, Transition};

    fn definition(initial: &str) -> WorkflowDefinition {
        WorkflowDefinition::draft(
            TenantId::new("acme"),
            "GENERIC",
            "Intake",
            EntityType::Entity,
            initial,
        )
        .with_state(State::new("new", "New"))
        .with_state(State::new("review", "In Review"))
        .with_state(State::new("done", "Done").final_state())
        .with_transition(Transition::new("new", "review", "Submit"))
        .with_transition(Transition::new("In Review", "done", "Approve"))
    }

    #[test]
    fn valid_definition_passes() {
        let report = StructuralValidator::check(&definition("new"));
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn initial_state_may_be_a_label() {
        assert!(StructuralValidator::check(&definition("New")).is_valid());
    }

    #[test]
    fn unknown_initial_state_is_an_error() {
        let report = StructuralValidator::check(&definition("draft"));
        assert!(!report.is_valid());
        assert!(report.errors[0].contains("'draft'"));
    }

    #[test]
    fn dangling_transition_is_an_error() {
        let def = definition("new").with_transition(Transition::new("done", "archived", "Archive"));
        let report = StructuralValidator::check(&def);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("archived"));
    }

    #[test]
    fn empty_definition_reports_name_and_states() {
        let def = WorkflowDefinition::draft(
            TenantId::new("acme"),
            "GENERIC",
            " ",
            EntityType::User,
            "x",
        );
        let report = StructuralValidator::check(&def);
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn duplicate_state_ids_are_errors() {
        let def = definition("new").with_state(State::new("new", "Again"));
        let report = StructuralValidator::check(&def);
        assert!(report.errors.iter().any(|e| e.contains("Duplicate state id: new")));
    }

    #[test]
    fn unreachable_and_missing_final_states_are_warnings() {
        let def = WorkflowDefinition::draft(
            TenantId::new("acme"),
            "GENERIC",
            "Loose",
            EntityType::Entity,
            "a",
        )
        .with_state(State::new("a", "A"))
        .with_state(State::new("b", "B"));
        let report = StructuralValidator::check(&def);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings.iter().any(|w| w.contains("'b' is unreachable")));
    }

    #[test]
    fn negative_min_documents_is_a_warning() {
        let mut def = definition("new");
        def.transitions[0].conditions.min_documents = -1;
        let report = StructuralValidator::check(&def);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
    }

    #[tokio::test]
    async fn validator_trait_delegates_to_check() {
        let context = ValidationContext::new(TenantId::new("acme"), CorrelationId::new("c-1"));
        let report = StructuralValidator
            .validate(&definition("draft"), &context)
            .await;
        assert!(!report.is_valid());
    }
}
