use super::{AUTOMATION_SOURCE, ActionHandler, WorkflowContext};
use crate::action::{Action, ActionKind, ActionResult, ActionType, HumanTaskParams};
use crate::store::TaskStore;
use crate::task::{TaskMetadata, WorkflowTask};
use async_trait::async_trait;
use ruleflow_core::{AuditRecord, AuditSink};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;

/// Case id used when the trigger payload names no case.
pub const UNLINKED_CASE: &str = "unlinked-case";

const DEFAULT_TITLE: &str = "Human validation required by workflow";
const DEFAULT_TASK_TYPE: &str = "DOCUMENT_REVIEW";
const DEFAULT_ROLE: &str = "ADMIN";

/// Opens a human task linked to the case that triggered the workflow.
pub struct HumanTaskHandler {
    tasks: Arc<dyn TaskStore>,
    audit: Arc<dyn AuditSink>,
}

impl HumanTaskHandler {
    #[must_use]
    pub fn new(tasks: Arc<dyn TaskStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self { tasks, audit }
    }

    /// Resolves the case id from `_id`, `id` or `caseId`, in that order.
    fn case_id(context: &WorkflowContext) -> String {
        ["_id", "id", "caseId"]
            .iter()
            .filter_map(|key| context.trigger_field(key))
            .find_map(|value| match value {
                JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
                JsonValue::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| UNLINKED_CASE.to_string())
    }

    fn build_task(params: &HumanTaskParams, context: &WorkflowContext) -> WorkflowTask {
        let mut task = WorkflowTask::new(
            context.tenant_id.clone(),
            Self::case_id(context),
            params.task_type.as_deref().unwrap_or(DEFAULT_TASK_TYPE),
            params.title.as_deref().unwrap_or(DEFAULT_TITLE),
            params.assigned_role.as_deref().unwrap_or(DEFAULT_ROLE),
        );
        task.description = Some(params.description.clone().unwrap_or_else(|| {
            format!("Human review required for workflow {}.", context.workflow_id)
        }));
        task.priority = params.priority.unwrap_or_default();
        task.checklist_config_id = params.checklist_config_id.clone();
        task.metadata = TaskMetadata {
            workflow_id: Some(context.workflow_id),
            node_label: params.label.clone(),
            correlation_id: Some(context.correlation_id.clone()),
            checklist_config_id: params.checklist_config_id.clone(),
            llm_proposal: None,
        };
        task
    }
}

#[async_trait]
impl ActionHandler for HumanTaskHandler {
    fn action_type(&self) -> ActionType {
        ActionType::HumanTask
    }

    async fn execute(&self, action: &Action, context: &WorkflowContext) -> ActionResult {
        let defaults = HumanTaskParams::default();
        let params = match &action.kind {
            ActionKind::HumanTask { params } => params,
            _ => &defaults,
        };
        let task = Self::build_task(params, context);
        let task_id = task.id;
        let title = task.title.clone();

        if let Err(e) = self.tasks.create_task(task).await {
            tracing::error!(
                workflow_id = %context.workflow_id,
                error = %e,
                "failed to create human task"
            );
            return ActionResult::failed(e.to_string());
        }

        tracing::info!(workflow_id = %context.workflow_id, %task_id, "human task created");
        self.audit
            .write(
                AuditRecord::info(
                    AUTOMATION_SOURCE,
                    "HUMAN_TASK_CREATED",
                    format!("Created task \"{title}\""),
                    context.correlation_id.clone(),
                )
                .with_tenant(context.tenant_id.clone())
                .with_details(json!({ "taskId": task_id, "workflowId": context.workflow_id })),
            )
            .await;

        ActionResult::success_with(json!({ "taskId": task_id.to_string() }))
    }
}
