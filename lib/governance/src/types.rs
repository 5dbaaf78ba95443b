//! Governance request and policy types.

use ruleflow_core::TenantId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Actor id the workflow engine presents when it mutates data on its own.
pub const WORKFLOW_ENGINE_ACTOR: &str = "WORKFLOW_ENGINE";

/// A question put to the governance engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernanceRequest {
    /// Who wants to act.
    pub actor_id: String,
    /// What is acted upon (an entity slug, or `*`).
    pub resource: String,
    /// What the actor wants to do (e.g. `update_entity`).
    pub operation: String,
    /// The tenant the action is scoped to.
    pub tenant_id: TenantId,
}

impl GovernanceRequest {
    /// Creates a new request.
    #[must_use]
    pub fn new(
        actor_id: impl Into<String>,
        resource: impl Into<String>,
        operation: impl Into<String>,
        tenant_id: TenantId,
    ) -> Self {
        Self {
            actor_id: actor_id.into(),
            resource: resource.into(),
            operation: operation.into(),
            tenant_id,
        }
    }
}

impl fmt::Display for GovernanceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} on {} (tenant {})",
            self.actor_id, self.operation, self.resource, self.tenant_id
        )
    }
}

/// The governance decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    /// Whether the action may proceed.
    pub can_execute: bool,
    /// Optional explanation, usually the rule that decided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Verdict {
    /// An allowing verdict.
    #[must_use]
    pub fn allow() -> Self {
        Self {
            can_execute: true,
            reason: None,
        }
    }

    /// A denying verdict with a reason.
    #[must_use]
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            can_execute: false,
            reason: Some(reason.into()),
        }
    }
}

/// Outcome of a matching policy rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Allow,
    Deny,
}

/// A single policy rule. `*` matches any resource or operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Tenant the rule applies to; `None` applies to every tenant.
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
    pub resource: String,
    pub operation: String,
    pub effect: Effect,
}

impl PolicyRule {
    /// A rule denying `operation` on `resource` for every tenant.
    #[must_use]
    pub fn deny(resource: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            tenant_id: None,
            resource: resource.into(),
            operation: operation.into(),
            effect: Effect::Deny,
        }
    }

    /// A rule allowing `operation` on `resource` for every tenant.
    #[must_use]
    pub fn allow(resource: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            tenant_id: None,
            resource: resource.into(),
            operation: operation.into(),
            effect: Effect::Allow,
        }
    }

    /// Restricts the rule to one tenant.
    #[must_use]
    pub fn for_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    /// Returns true if this rule applies to the request.
    #[must_use]
    pub fn matches(&self, request: &GovernanceRequest) -> bool {
        let tenant_ok = self
            .tenant_id
            .as_ref()
            .is_none_or(|t| *t == request.tenant_id);
        tenant_ok
            && pattern_matches(&self.resource, &request.resource)
            && pattern_matches(&self.operation, &request.operation)
    }
}

fn pattern_matches(pattern: &str, value: &str) -> bool {
    pattern == "*" || pattern == value
}
