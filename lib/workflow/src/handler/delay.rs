use super::{ActionHandler, WorkflowContext, as_number};
use crate::action::{Action, ActionResult, ActionType};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

const DEFAULT_DELAY_MS: u64 = 1000;

/// Suspends the chain for `params.duration` in `params.unit`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelayHandler;

impl DelayHandler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Resolves the wait in milliseconds.
    ///
    /// Units are `ms` (default), `s` and `m`; anything else counts as `ms`.
    /// A missing, non-numeric or non-positive duration waits one second.
    fn delay_ms(action: &Action) -> u64 {
        let Some(duration) = action
            .param("duration")
            .and_then(as_number)
            .filter(|d| d.is_finite() && *d > 0.0)
        else {
            return DEFAULT_DELAY_MS;
        };
        let factor = match action.param_str("unit") {
            Some("s") => 1000.0,
            Some("m") => 60_000.0,
            _ => 1.0,
        };
        (duration * factor).round() as u64
    }
}

#[async_trait]
impl ActionHandler for DelayHandler {
    fn action_type(&self) -> ActionType {
        ActionType::Delay
    }

    async fn execute(&self, action: &Action, context: &WorkflowContext) -> ActionResult {
        let delay_ms = Self::delay_ms(action);
        tracing::info!(workflow_id = %context.workflow_id, delay_ms, "delaying workflow");

        tokio::select! {
            () = tokio::time::sleep(Duration::from_millis(delay_ms)) => {
                ActionResult::success_with(json!({ "delayMs": delay_ms }))
            }
            () = context.cancellation.cancelled() => {
                tracing::warn!(workflow_id = %context.workflow_id, "delay cancelled");
                ActionResult::failed("Delay cancelled")
            }
        }
    }
}
