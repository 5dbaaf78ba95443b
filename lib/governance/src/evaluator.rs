//! Governance evaluator contract and the policy-table implementation.

use crate::error::GovernanceError;
use crate::types::{Effect, GovernanceRequest, PolicyRule, Verdict};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// A governance decision point.
///
/// Implementations may call a remote policy service; the engine only
/// consumes the returned [`Verdict`].
#[async_trait]
pub trait GovernanceEvaluator: Send + Sync {
    /// Decides whether the requested action may proceed.
    ///
    /// # Errors
    ///
    /// Returns an error if the decision could not be made.
    async fn evaluate(&self, request: &GovernanceRequest) -> Result<Verdict, GovernanceError>;
}

/// Ordered rule table. The first matching rule decides; when no rule
/// matches, the default effect applies.
#[derive(Debug, Clone)]
pub struct PolicyGovernance {
    rules: Vec<PolicyRule>,
    default_effect: Effect,
}

impl PolicyGovernance {
    /// A policy table that allows everything not explicitly denied.
    #[must_use]
    pub fn allow_by_default() -> Self {
        Self {
            rules: Vec::new(),
            default_effect: Effect::Allow,
        }
    }

    /// A policy table that denies everything not explicitly allowed.
    #[must_use]
    pub fn deny_by_default() -> Self {
        Self {
            rules: Vec::new(),
            default_effect: Effect::Deny,
        }
    }

    /// Appends a rule.
    #[must_use]
    pub fn with_rule(mut self, rule: PolicyRule) -> Self {
        self.rules.push(rule);
        self
    }

    fn decide(&self, request: &GovernanceRequest) -> Verdict {
        match self.rules.iter().find(|rule| rule.matches(request)) {
            Some(rule) => match rule.effect {
                Effect::Allow => Verdict::allow(),
                Effect::Deny => Verdict::deny(format!(
                    "denied by rule {} on {}",
                    rule.operation, rule.resource
                )),
            },
            None => match self.default_effect {
                Effect::Allow => Verdict::allow(),
                Effect::Deny => Verdict::deny("no rule allows this action"),
            },
        }
    }
}

impl Default for PolicyGovernance {
    fn default() -> Self {
        Self::allow_by_default()
    }
}

#[async_trait]
impl GovernanceEvaluator for PolicyGovernance {
    #[instrument(skip(self), fields(tenant_id = %request.tenant_id, resource = %request.resource))]
    async fn evaluate(&self, request: &GovernanceRequest) -> Result<Verdict, GovernanceError> {
        if request.actor_id.is_empty() {
            return Err(GovernanceError::InvalidInput {
                details: "actor id is empty".to_string(),
            });
        }

        let verdict = self.decide(request);
        debug!(can_execute = verdict.can_execute, "governance verdict");
        Ok(verdict)
    }
}
