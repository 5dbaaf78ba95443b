use super::{AUTOMATION_SOURCE, ActionHandler, WorkflowContext};
use crate::action::{Action, ActionResult, ActionType};
use async_trait::async_trait;
use ruleflow_core::{AuditRecord, AuditSink};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;

/// Records a notification for `params.recipient`.
///
/// Delivery happens outside the engine, so this always succeeds.
pub struct NotifyHandler {
    audit: Arc<dyn AuditSink>,
}

impl NotifyHandler {
    #[must_use]
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self { audit }
    }
}

#[async_trait]
impl ActionHandler for NotifyHandler {
    fn action_type(&self) -> ActionType {
        ActionType::Notify
    }

    async fn execute(&self, action: &Action, context: &WorkflowContext) -> ActionResult {
        let recipient = action.param("recipient").cloned().unwrap_or(JsonValue::Null);
        let shown = recipient
            .as_str()
            .map_or_else(|| recipient.to_string(), str::to_string);

        tracing::info!(
            workflow_id = %context.workflow_id,
            recipient = %shown,
            "sending workflow notification"
        );
        self.audit
            .write(
                AuditRecord::info(
                    AUTOMATION_SOURCE,
                    "NOTIFY",
                    format!("Notification sent to {shown}"),
                    context.correlation_id.clone(),
                )
                .with_tenant(context.tenant_id.clone())
                .with_details(json!({ "recipient": recipient })),
            )
            .await;

        ActionResult::success_with(json!({ "recipient": recipient }))
    }
}
