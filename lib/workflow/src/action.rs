//! Workflow actions.
//!
//! An action is one step of a workflow's effect chain. The `type` tag is a
//! closed set; every variant carries a free-form parameter map except
//! `human_task`, whose parameters are structured.

use crate::task::TaskPriority;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Free-form action parameters.
pub type Params = serde_json::Map<String, JsonValue>;

/// The closed set of action type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Notify,
    Log,
    UpdateEntity,
    ExternalWebhook,
    Branch,
    Delay,
    Iterator,
    HumanTask,
}

impl ActionType {
    /// Returns the wire name of the action type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Notify => "notify",
            Self::Log => "log",
            Self::UpdateEntity => "update_entity",
            Self::ExternalWebhook => "external_webhook",
            Self::Branch => "branch",
            Self::Delay => "delay",
            Self::Iterator => "iterator",
            Self::HumanTask => "human_task",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured parameters of a `human_task` action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanTaskParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklist_config_id: Option<String>,
    /// Display label of the node, copied into the task metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Action variants, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    Notify {
        #[serde(default)]
        params: Params,
    },
    Log {
        #[serde(default)]
        params: Params,
    },
    UpdateEntity {
        #[serde(default)]
        params: Params,
    },
    ExternalWebhook {
        #[serde(default)]
        params: Params,
    },
    Branch {
        #[serde(default)]
        params: Params,
    },
    Delay {
        #[serde(default)]
        params: Params,
    },
    Iterator {
        #[serde(default)]
        params: Params,
    },
    HumanTask {
        #[serde(default)]
        params: HumanTaskParams,
    },
}

/// One step of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Node id for telemetry correlation. Actions without one emit no telemetry.
    #[serde(rename = "nodeId", default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(flatten)]
    pub kind: ActionKind,
}

impl Action {
    /// Creates an action without a telemetry node id.
    #[must_use]
    pub fn new(kind: ActionKind) -> Self {
        Self {
            node_id: None,
            kind,
        }
    }

    /// Creates a free-form action of the given type.
    ///
    /// `human_task` actions get default structured parameters; use
    /// [`Action::human_task`] to set them.
    #[must_use]
    pub fn with_params(action_type: ActionType, params: Params) -> Self {
        let kind = match action_type {
            ActionType::Notify => ActionKind::Notify { params },
            ActionType::Log => ActionKind::Log { params },
            ActionType::UpdateEntity => ActionKind::UpdateEntity { params },
            ActionType::ExternalWebhook => ActionKind::ExternalWebhook { params },
            ActionType::Branch => ActionKind::Branch { params },
            ActionType::Delay => ActionKind::Delay { params },
            ActionType::Iterator => ActionKind::Iterator { params },
            ActionType::HumanTask => ActionKind::HumanTask {
                params: HumanTaskParams::default(),
            },
        };
        Self::new(kind)
    }

    /// Creates a `human_task` action.
    #[must_use]
    pub fn human_task(params: HumanTaskParams) -> Self {
        Self::new(ActionKind::HumanTask { params })
    }

    /// Sets the telemetry node id.
    #[must_use]
    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    /// Returns the type tag of this action.
    #[must_use]
    pub fn action_type(&self) -> ActionType {
        match &self.kind {
            ActionKind::Notify { .. } => ActionType::Notify,
            ActionKind::Log { .. } => ActionType::Log,
            ActionKind::UpdateEntity { .. } => ActionType::UpdateEntity,
            ActionKind::ExternalWebhook { .. } => ActionType::ExternalWebhook,
            ActionKind::Branch { .. } => ActionType::Branch,
            ActionKind::Delay { .. } => ActionType::Delay,
            ActionKind::Iterator { .. } => ActionType::Iterator,
            ActionKind::HumanTask { .. } => ActionType::HumanTask,
        }
    }

    /// Returns the free-form parameters, or `None` for `human_task`.
    #[must_use]
    pub fn params(&self) -> Option<&Params> {
        match &self.kind {
            ActionKind::Notify { params }
            | ActionKind::Log { params }
            | ActionKind::UpdateEntity { params }
            | ActionKind::ExternalWebhook { params }
            | ActionKind::Branch { params }
            | ActionKind::Delay { params }
            | ActionKind::Iterator { params } => Some(params),
            ActionKind::HumanTask { .. } => None,
        }
    }

    /// Looks up a single free-form parameter.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&JsonValue> {
        self.params().and_then(|p| p.get(key))
    }

    /// Looks up a string parameter.
    #[must_use]
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.param(key).and_then(JsonValue::as_str)
    }
}

/// Outcome status of a single action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionStatus {
    Success,
    Failed,
}

/// Result returned by every action handler.
///
/// Handler problems are reported here rather than as errors so that one
/// failing action never aborts the rest of the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub status: ActionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<JsonValue>,
}

impl ActionResult {
    /// A successful result without output.
    #[must_use]
    pub fn success() -> Self {
        Self {
            status: ActionStatus::Success,
            error_message: None,
            output: None,
        }
    }

    /// A successful result carrying output.
    #[must_use]
    pub fn success_with(output: JsonValue) -> Self {
        Self {
            status: ActionStatus::Success,
            error_message: None,
            output: Some(output),
        }
    }

    /// A failed result.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::Failed,
            error_message: Some(message.into()),
            output: None,
        }
    }

    /// Returns true if the action succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ActionStatus::Success
    }
}
