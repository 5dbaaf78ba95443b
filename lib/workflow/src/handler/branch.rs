use super::{ActionHandler, WorkflowContext, as_number};
use crate::action::{Action, ActionResult, ActionType};
use async_trait::async_trait;
use serde_json::json;

const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Classifies the trigger payload into a qualitative path.
///
/// The classification is only reported; the chain continues unchanged.
#[derive(Debug, Clone, Copy)]
pub struct BranchHandler {
    risk_threshold: f64,
}

impl BranchHandler {
    /// Creates a handler using `risk_threshold` when a node sets none.
    #[must_use]
    pub fn new(risk_threshold: f64) -> Self {
        Self { risk_threshold }
    }

    fn criterion(action: &Action, key: &str) -> Option<f64> {
        action
            .param("criteria")
            .and_then(|criteria| criteria.get(key))
            .and_then(as_number)
    }
}

#[async_trait]
impl ActionHandler for BranchHandler {
    fn action_type(&self) -> ActionType {
        ActionType::Branch
    }

    async fn execute(&self, action: &Action, context: &WorkflowContext) -> ActionResult {
        let risk_score = context
            .trigger_field("riskScore")
            .or_else(|| context.trigger_field("score"))
            .and_then(as_number)
            .unwrap_or(0.0);
        let confidence = context
            .trigger_field("confidenceScore")
            .and_then(as_number)
            .unwrap_or(1.0);
        let risk_threshold =
            Self::criterion(action, "riskThreshold").unwrap_or(self.risk_threshold);
        let confidence_threshold = Self::criterion(action, "confidenceThreshold")
            .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD);

        let path = if confidence < confidence_threshold {
            "Low Confidence"
        } else if risk_score >= risk_threshold {
            "Critical Path"
        } else {
            "Standard Path"
        };

        tracing::info!(
            workflow_id = %context.workflow_id,
            path,
            risk_score,
            confidence,
            "branch evaluated"
        );

        ActionResult::success_with(json!({
            "path": path,
            "riskScore": risk_score,
            "confidence": confidence,
        }))
    }
}
