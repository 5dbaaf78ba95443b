//! Automation workflow definition.
//!
//! An automation workflow is a trigger plus an ordered chain of actions,
//! owned by one tenant. The event processor treats it as read-only.

use crate::action::Action;
use crate::trigger::Trigger;
use chrono::{DateTime, Utc};
use ruleflow_core::{TenantId, WorkflowId};
use serde::{Deserialize, Serialize};

/// A trigger-to-actions automation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    /// Minted on load when absent.
    #[serde(default)]
    pub id: WorkflowId,
    pub name: String,
    pub trigger: Trigger,
    /// Executed strictly in order.
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Inactive workflows never match.
    pub active: bool,
    pub tenant_id: TenantId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Creates an active workflow with no actions.
    #[must_use]
    pub fn new(tenant_id: TenantId, name: impl Into<String>, trigger: Trigger) -> Self {
        let now = Utc::now();
        Self {
            id: WorkflowId::new(),
            name: name.into(),
            trigger,
            actions: Vec::new(),
            active: true,
            tenant_id,
            industry: None,
            environment: None,
            version: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends an action to the chain.
    #[must_use]
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Sets the industry vertical.
    #[must_use]
    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }

    /// Returns whether the workflow takes part in trigger matching.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Activates the workflow.
    pub fn activate(&mut self) {
        self.active = true;
        self.updated_at = Utc::now();
    }

    /// Deactivates the workflow.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionType, Params};
    use crate::trigger::{Condition, Operator, TriggerType};
    use serde_json::json;

    fn risk_trigger() -> Trigger {
        Trigger::new(
            TriggerType::OnRisk,
            Condition::new("riskScore", Operator::Gt, json!(75)),
        )
    }

    #[test]
    fn workflow_creation() {
        let workflow = Workflow::new(TenantId::new("acme"), "Escalate", risk_trigger())
            .with_action(Action::with_params(ActionType::Log, Params::new()));
        assert!(workflow.is_active());
        assert_eq!(workflow.actions.len(), 1);
    }

    #[test]
    fn workflow_activate_deactivate() {
        let mut workflow = Workflow::new(TenantId::new("acme"), "Escalate", risk_trigger());
        workflow.deactivate();
        assert!(!workflow.is_active());
        workflow.activate();
        assert!(workflow.is_active());
    }

    #[test]
    fn workflow_deserializes_without_timestamps() {
        let workflow: Workflow = serde_json::from_value(json!({
            "id": WorkflowId::new(),
            "name": "Escalate high risk",
            "tenantId": "acme",
            "active": true,
            "trigger": {
                "type": "on_risk",
                "condition": {"field": "riskScore", "operator": "gt", "value": 75}
            },
            "actions": [
                {"type": "notify", "params": {"recipient": "ops@acme.test"}},
                {"type": "log", "nodeId": "log-1", "params": {"message": "high risk"}}
            ]
        }))
        .unwrap();

        assert_eq!(workflow.actions.len(), 2);
        assert_eq!(workflow.actions[1].action_type(), ActionType::Log);
        assert_eq!(workflow.tenant_id, TenantId::new("acme"));
    }
}
