use super::{ActionHandler, WorkflowContext};
use crate::action::{Action, ActionResult, ActionType};
use crate::store::EntityStore;
use async_trait::async_trait;
use ruleflow_governance::{GovernanceEvaluator, GovernanceRequest, WORKFLOW_ENGINE_ACTOR};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;

const OPERATION: &str = "update_entity";

/// Applies `params.updates` to the entity named by the trigger payload,
/// after the governance engine has allowed it.
pub struct UpdateEntityHandler {
    governance: Arc<dyn GovernanceEvaluator>,
    entities: Arc<dyn EntityStore>,
}

impl UpdateEntityHandler {
    #[must_use]
    pub fn new(governance: Arc<dyn GovernanceEvaluator>, entities: Arc<dyn EntityStore>) -> Self {
        Self {
            governance,
            entities,
        }
    }

    fn target_id(action: &Action, context: &WorkflowContext) -> Option<String> {
        let field = action.param_str("idField")?;
        match context.trigger_field(field)? {
            JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[async_trait]
impl ActionHandler for UpdateEntityHandler {
    fn action_type(&self) -> ActionType {
        ActionType::UpdateEntity
    }

    async fn execute(&self, action: &Action, context: &WorkflowContext) -> ActionResult {
        let entity_slug = action.param_str("entitySlug").filter(|s| !s.is_empty());

        let request = GovernanceRequest::new(
            WORKFLOW_ENGINE_ACTOR,
            entity_slug.unwrap_or("*"),
            OPERATION,
            context.tenant_id.clone(),
        );
        let verdict = match self.governance.evaluate(&request).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::error!(%request, error = %e, "governance evaluation failed");
                return ActionResult::failed(e.to_string());
            }
        };
        if !verdict.can_execute {
            tracing::warn!(%request, reason = ?verdict.reason, "update blocked by governance");
            return ActionResult::failed("Blocked by Governance Engine");
        }

        let (Some(entity_slug), Some(id)) = (entity_slug, Self::target_id(action, context)) else {
            return ActionResult::failed("Missing ID or EntitySlug for update");
        };

        let updates = action
            .param("updates")
            .cloned()
            .unwrap_or_else(|| json!({}));
        if let Err(e) = self
            .entities
            .update_entity(entity_slug, &id, &updates, &context.tenant_id)
            .await
        {
            tracing::error!(entity_slug, %id, error = %e, "entity update failed");
            return ActionResult::failed(e.to_string());
        }

        tracing::info!(entity_slug, %id, workflow_id = %context.workflow_id, "entity updated");
        ActionResult::success_with(json!({ "entitySlug": entity_slug, "id": id }))
    }
}
