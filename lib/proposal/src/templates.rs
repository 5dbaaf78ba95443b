//! Compiled-in master prompt templates.
//!
//! Used when a tenant has no template of its own, or its template fails to
//! render.

use ruleflow_ai::{PromptTemplate, VariableDefinition};

/// Key of the template that routes a request to an existing definition or a
/// new one.
pub const WORKFLOW_ROUTER: &str = "WORKFLOW_ROUTER";

/// Key of the template that drafts a full definition.
pub const WORKFLOW_GENERATOR: &str = "WORKFLOW_GENERATOR";

const SYSTEM: &str = "You design workflow state machines for {{vertical}} operations. \
Answer with a single JSON object and nothing else.";

const ROUTER: &str = r#"A user in the {{industry}} industry needs a workflow for entities of type {{entityType}}.

Request:
{{description}}

Existing workflows:
{{existingWorkflows}}

Decide whether one of the existing workflows already covers the request.
Respond with JSON of the form:
{"action": "USE_EXISTING" | "PROPOSE_NEW", "workflowId": "<id when USE_EXISTING>", "reason": "<short justification>", "confidence": <number between 0 and 1>}"#;

const GENERATOR: &str = r#"Design a workflow for entities of type {{entityType}} in the {{industry}} industry.

Process description:
{{description}}

Respond with JSON of the form:
{
  "name": "<workflow name>",
  "entityType": "{{entityType}}",
  "states": [{"id": "<slug>", "label": "<label>", "color": "<hex>", "is_initial": bool, "is_final": bool, "can_edit": bool, "requires_validation": bool, "roles_allowed": ["<role>"]}],
  "transitions": [{"from": "<state id>", "to": "<state id>", "label": "<label>", "required_role": ["<role>"], "conditions": {"checklist_complete": bool, "min_documents": int, "require_signature": bool, "require_comment": bool}}],
  "initial_state": "<state id>"
}
Every transition must reference declared state ids and exactly one state must be initial."#;

fn with_common_variables(template: PromptTemplate) -> PromptTemplate {
    template
        .with_system_prompt(SYSTEM)
        .with_variable("vertical", VariableDefinition::required("Tenant vertical"))
        .with_variable("industry", VariableDefinition::required("Industry"))
        .with_variable("entityType", VariableDefinition::required("Entity type"))
        .with_variable("description", VariableDefinition::required("Request text"))
}

/// Returns the master template for `key`, if there is one.
#[must_use]
pub fn master_template(key: &str) -> Option<PromptTemplate> {
    match key {
        WORKFLOW_ROUTER => Some(
            with_common_variables(
                PromptTemplate::new(WORKFLOW_ROUTER, ROUTER)
                    .with_description("Reuse an existing workflow or propose a new one"),
            )
            .with_variable(
                "existingWorkflows",
                VariableDefinition::required("Summaries of the tenant's workflows"),
            ),
        ),
        WORKFLOW_GENERATOR => Some(with_common_variables(
            PromptTemplate::new(WORKFLOW_GENERATOR, GENERATOR)
                .with_description("Draft a complete workflow definition"),
        )),
        _ => None,
    }
}
