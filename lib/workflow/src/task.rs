//! Human tasks created by workflows.
//!
//! Tasks are created by the human-task handler only. Later status changes
//! belong to the task-management flow, which lives outside this crate.

use chrono::{DateTime, Utc};
use ruleflow_core::{CorrelationId, TaskId, TenantId, WorkflowId};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Rejected,
    Cancelled,
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Provenance of a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<WorkflowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklist_config_id: Option<String>,
    /// Model output that motivated the task, when an AI node created it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_proposal: Option<JsonValue>,
}

/// A human-assigned work item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTask {
    pub id: TaskId,
    pub tenant_id: TenantId,
    pub case_id: String,
    #[serde(rename = "type")]
    pub task_type: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub assigned_role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_user_id: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub metadata: TaskMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklist_config_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowTask {
    /// Creates a pending task with medium priority.
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        case_id: impl Into<String>,
        task_type: impl Into<String>,
        title: impl Into<String>,
        assigned_role: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            tenant_id,
            case_id: case_id.into(),
            task_type: task_type.into(),
            title: title.into(),
            description: None,
            assigned_role: assigned_role.into(),
            assigned_user_id: None,
            status: TaskStatus::Pending,
            priority: TaskPriority::default(),
            metadata: TaskMetadata::default(),
            checklist_config_id: None,
            due_date: None,
            completed_at: None,
            completed_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}
