//! Turns a model proposal into a draft workflow definition.

use crate::schema::{Proposal, ProposedState, ProposedTransition};
use ruleflow_core::TenantId;
use ruleflow_workflow::state_machine::{
    DEFAULT_STATE_COLOR, default_state_roles, default_transition_roles,
};
use ruleflow_workflow::{
    DecisionStrategy, State, Transition, TransitionConditions, WorkflowDefinition,
};

fn assemble_state(state: ProposedState) -> State {
    State {
        id: state.id,
        label: state.label,
        color: state
            .color
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STATE_COLOR.to_string()),
        icon: state.icon,
        is_initial: state.is_initial,
        is_final: state.is_final,
        can_edit: state.can_edit.unwrap_or(true),
        requires_validation: state.requires_validation.unwrap_or(false),
        roles_allowed: state.roles_allowed.unwrap_or_else(default_state_roles),
    }
}

fn assemble_transition(transition: ProposedTransition) -> Transition {
    let conditions = transition.conditions.unwrap_or_default();
    Transition {
        from: transition.from,
        to: transition.to,
        label: transition.label,
        required_role: transition
            .required_role
            .unwrap_or_else(default_transition_roles),
        decision_strategy: DecisionStrategy::User,
        probability: 1.0,
        conditions: TransitionConditions {
            checklist_complete: conditions.checklist_complete.unwrap_or(false),
            min_documents: conditions.min_documents.unwrap_or(0),
            require_signature: conditions.require_signature.unwrap_or(false),
            require_comment: conditions.require_comment.unwrap_or(false),
        },
        actions: transition.actions,
    }
}

/// Builds an inactive version-1 draft from a proposal, filling defaults.
#[must_use]
pub fn assemble(proposal: Proposal, tenant_id: TenantId, industry: &str) -> WorkflowDefinition {
    let mut definition = WorkflowDefinition::draft(
        tenant_id,
        industry,
        proposal.name,
        proposal.entity_type,
        proposal.initial_state,
    );
    definition.states = proposal.states.into_iter().map(assemble_state).collect();
    definition.transitions = proposal
        .transitions
        .into_iter()
        .map(assemble_transition)
        .collect();
    definition
}
