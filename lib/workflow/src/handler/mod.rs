//! Action handlers and the registry that dispatches to them.
//!
//! A handler executes one action type. Handlers never return errors: every
//! problem is reported as a FAILED [`ActionResult`] so that the event
//! processor can carry on with the rest of the chain.

mod branch;
mod delay;
mod human_task;
mod log;
mod notify;
mod update_entity;

pub use branch::BranchHandler;
pub use delay::DelayHandler;
pub use human_task::HumanTaskHandler;
pub use log::LogHandler;
pub use notify::NotifyHandler;
pub use update_entity::UpdateEntityHandler;

use crate::action::{Action, ActionResult, ActionType};
use crate::config::EngineConfig;
use crate::store::{EntityStore, TaskStore};
use async_trait::async_trait;
use ruleflow_core::{AuditSink, CorrelationId, TenantId, WorkflowId};
use ruleflow_governance::GovernanceEvaluator;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Audit source of records written by action handlers.
pub const AUTOMATION_SOURCE: &str = "AI_AUTOMATION";

/// Execution context shared by every action of one matched workflow.
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    pub workflow_id: WorkflowId,
    pub tenant_id: TenantId,
    pub correlation_id: CorrelationId,
    /// The payload of the event that matched the trigger.
    pub trigger_data: JsonValue,
    /// Cancelled when the engine shuts down.
    pub cancellation: CancellationToken,
}

impl WorkflowContext {
    #[must_use]
    pub fn new(
        workflow_id: WorkflowId,
        tenant_id: TenantId,
        correlation_id: CorrelationId,
        trigger_data: JsonValue,
    ) -> Self {
        Self {
            workflow_id,
            tenant_id,
            correlation_id,
            trigger_data,
            cancellation: CancellationToken::new(),
        }
    }

    /// Replaces the cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Looks up a top-level field of the trigger payload.
    #[must_use]
    pub fn trigger_field(&self, field: &str) -> Option<&JsonValue> {
        self.trigger_data.get(field)
    }
}

/// Executor of a single action type.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// The action type this handler executes.
    fn action_type(&self) -> ActionType;

    /// Executes the action.
    async fn execute(&self, action: &Action, context: &WorkflowContext) -> ActionResult;
}

/// Maps action types to handlers.
#[derive(Default, Clone)]
pub struct ActionRegistry {
    handlers: HashMap<ActionType, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the six built-in handlers.
    #[must_use]
    pub fn standard(
        config: &EngineConfig,
        audit: Arc<dyn AuditSink>,
        tasks: Arc<dyn TaskStore>,
        entities: Arc<dyn EntityStore>,
        governance: Arc<dyn GovernanceEvaluator>,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(NotifyHandler::new(audit.clone())));
        registry.register(Arc::new(LogHandler::new(audit.clone())));
        registry.register(Arc::new(DelayHandler::new()));
        registry.register(Arc::new(BranchHandler::new(config.branch_risk_threshold)));
        registry.register(Arc::new(HumanTaskHandler::new(tasks, audit)));
        registry.register(Arc::new(UpdateEntityHandler::new(governance, entities)));
        registry
    }

    /// Registers a handler, replacing any previous handler of the same type.
    pub fn register(&mut self, handler: Arc<dyn ActionHandler>) {
        self.handlers.insert(handler.action_type(), handler);
    }

    /// Returns whether a handler is registered for the type.
    #[must_use]
    pub fn contains(&self, action_type: ActionType) -> bool {
        self.handlers.contains_key(&action_type)
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Executes an action with the handler registered for its type.
    pub async fn dispatch(&self, action: &Action, context: &WorkflowContext) -> ActionResult {
        let action_type = action.action_type();
        match self.handlers.get(&action_type) {
            Some(handler) => handler.execute(action, context).await,
            None => {
                tracing::warn!(
                    action_type = %action_type,
                    workflow_id = %context.workflow_id,
                    "no handler registered"
                );
                ActionResult::failed(format!("No handler found for action type: {action_type}"))
            }
        }
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Reads a JSON value as `f64`, accepting numeric strings.
pub(crate) fn as_number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::action::{ActionStatus, Params};
    use crate::memory::InMemoryWorkflowStore;
    use ruleflow_core::MemoryAuditSink;
    use ruleflow_governance::PolicyGovernance;
    use serde_json::json;

    pub(crate) fn context(trigger_data: JsonValue) -> WorkflowContext {
        WorkflowContext::new(
            WorkflowId::new(),
            TenantId::new("acme"),
            CorrelationId::new("corr-1"),
            trigger_data,
        )
    }

    pub(crate) fn action(action_type: ActionType, params: JsonValue) -> Action {
        let params: Params = serde_json::from_value(params).unwrap_or_default();
        Action::with_params(action_type, params)
    }

    struct Fixed(ActionType, ActionResult);

    #[async_trait]
    impl ActionHandler for Fixed {
        fn action_type(&self) -> ActionType {
            self.0
        }

        async fn execute(&self, _action: &Action, _context: &WorkflowContext) -> ActionResult {
            self.1.clone()
        }
    }

    #[tokio::test]
    async fn missing_handler_is_a_failed_result() {
        let registry = ActionRegistry::new();
        let result = registry
            .dispatch(
                &action(ActionType::ExternalWebhook, json!({})),
                &context(json!({})),
            )
            .await;

        assert_eq!(result.status, ActionStatus::Failed);
        assert_eq!(
            result.error_message.as_deref(),
            Some("No handler found for action type: external_webhook")
        );
    }

    #[tokio::test]
    async fn register_replaces_existing_handler() {
        let mut registry = ActionRegistry::new();
        registry.register(Arc::new(Fixed(ActionType::Log, ActionResult::failed("old"))));
        registry.register(Arc::new(Fixed(ActionType::Log, ActionResult::success())));

        assert_eq!(registry.len(), 1);
        let result = registry
            .dispatch(&action(ActionType::Log, json!({})), &context(json!({})))
            .await;
        assert!(result.is_success());
    }

    #[test]
    fn standard_registry_has_six_handlers() {
        let store = Arc::new(InMemoryWorkflowStore::new());
        let registry = ActionRegistry::standard(
            &EngineConfig::default(),
            Arc::new(MemoryAuditSink::new()),
            store.clone(),
            store,
            Arc::new(PolicyGovernance::allow_by_default()),
        );

        assert_eq!(registry.len(), 6);
        assert!(!registry.contains(ActionType::ExternalWebhook));
        assert!(!registry.contains(ActionType::Iterator));
        assert!(registry.contains(ActionType::HumanTask));
    }

    #[test]
    fn numbers_parse_from_strings() {
        assert_eq!(as_number(&json!(2)), Some(2.0));
        assert_eq!(as_number(&json!(" 1.5 ")), Some(1.5));
        assert_eq!(as_number(&json!("soon")), None);
        assert_eq!(as_number(&json!(null)), None);
    }
}
