use super::{AUTOMATION_SOURCE, ActionHandler, WorkflowContext};
use crate::action::{Action, ActionResult, ActionType};
use async_trait::async_trait;
use ruleflow_core::{AuditRecord, AuditSink};
use serde_json::json;
use std::sync::Arc;

const DEFAULT_MESSAGE: &str = "Automated alert detected";

/// Raises a WARN audit alert carrying the trigger payload.
pub struct LogHandler {
    audit: Arc<dyn AuditSink>,
}

impl LogHandler {
    #[must_use]
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self { audit }
    }
}

#[async_trait]
impl ActionHandler for LogHandler {
    fn action_type(&self) -> ActionType {
        ActionType::Log
    }

    async fn execute(&self, action: &Action, context: &WorkflowContext) -> ActionResult {
        let message = action.param_str("message").unwrap_or(DEFAULT_MESSAGE);
        let record = AuditRecord::warn(
            AUTOMATION_SOURCE,
            "AUTOMATED_ALERT",
            message,
            context.correlation_id.clone(),
        )
        .with_tenant(context.tenant_id.clone())
        .with_details(json!({ "triggerData": context.trigger_data }));
        self.audit.write(record).await;
        ActionResult::success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::tests::{action, context};
    use ruleflow_core::{AuditLevel, MemoryAuditSink};

    #[tokio::test]
    async fn log_writes_warn_alert_with_payload() {
        let audit = Arc::new(MemoryAuditSink::new());
        let handler = LogHandler::new(audit.clone());
        let result = handler
            .execute(
                &action(ActionType::Log, json!({"message": "risk spike"})),
                &context(json!({"riskScore": 91})),
            )
            .await;

        assert!(result.is_success());
        let records = audit.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, AuditLevel::Warn);
        assert_eq!(records[0].message, "risk spike");
        assert_eq!(
            records[0].details,
            Some(json!({"triggerData": {"riskScore": 91}}))
        );
    }

    #[tokio::test]
    async fn log_uses_default_message() {
        let audit = Arc::new(MemoryAuditSink::new());
        LogHandler::new(audit.clone())
            .execute(&action(ActionType::Log, json!({})), &context(json!({})))
            .await;
        assert_eq!(audit.records()[0].message, DEFAULT_MESSAGE);
    }
}
