//! Event processing.
//!
//! The event processor turns one inbound domain event into workflow runs:
//! 1. Load the tenant's active workflows for the event's trigger type
//! 2. Evaluate each workflow's trigger against the payload
//! 3. Run the action chain of every matched workflow, strictly in order
//! 4. Emit telemetry for every node that carries a node id
//!
//! A failed action never stops the chain or the remaining workflows.

use crate::action::{Action, ActionResult, ActionStatus, ActionType};
use crate::config::EngineConfig;
use crate::definition::Workflow;
use crate::error::EngineError;
use crate::handler::{ActionRegistry, WorkflowContext};
use crate::store::WorkflowStore;
use crate::telemetry::{NodeType, TelemetryEvent, TelemetryRecorder, TelemetryStatus};
use crate::trigger::TriggerType;
use chrono::Utc;
use rootcause::prelude::Report;
use ruleflow_core::{AuditRecord, AuditSink, CorrelationId, TenantId, WorkflowId};
use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Audit source of records written by the event processor.
pub const ENGINE_SOURCE: &str = "AI_WORKFLOW_ENGINE";

/// Result of one action in a matched workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    pub action_type: ActionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub result: ActionResult,
}

/// Result of one candidate workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowOutcome {
    pub workflow_id: WorkflowId,
    pub name: String,
    pub matched: bool,
    /// Action results in execution order; empty when not matched.
    pub actions: Vec<ActionOutcome>,
}

/// Summary of one processed event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventOutcome {
    pub workflows: Vec<WorkflowOutcome>,
}

impl EventOutcome {
    /// Returns the workflows whose trigger matched.
    pub fn matched(&self) -> impl Iterator<Item = &WorkflowOutcome> {
        self.workflows.iter().filter(|w| w.matched)
    }

    /// Returns the number of failed actions across all workflows.
    #[must_use]
    pub fn failed_actions(&self) -> usize {
        self.workflows
            .iter()
            .flat_map(|w| &w.actions)
            .filter(|a| a.result.status == ActionStatus::Failed)
            .count()
    }
}

/// Matches inbound events against stored workflows and runs their actions.
pub struct EventProcessor {
    store: Arc<dyn WorkflowStore>,
    registry: ActionRegistry,
    telemetry: Arc<dyn TelemetryRecorder>,
    audit: Arc<dyn AuditSink>,
    handler_timeout: Option<Duration>,
    shutdown: CancellationToken,
}

impl EventProcessor {
    /// Creates a processor with the default handler timeout.
    #[must_use]
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        registry: ActionRegistry,
        telemetry: Arc<dyn TelemetryRecorder>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            store,
            registry,
            telemetry,
            audit,
            handler_timeout: EngineConfig::default().handler_timeout(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Applies the engine configuration.
    #[must_use]
    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.handler_timeout = config.handler_timeout();
        self
    }

    /// Sets the per-handler timeout; `None` disables it.
    #[must_use]
    pub fn with_handler_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.handler_timeout = timeout;
        self
    }

    /// Returns the token cancelled by [`EventProcessor::shutdown`].
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stops accepting events and cancels in-flight delays.
    pub fn shutdown(&self) {
        tracing::info!("event processor shutting down");
        self.shutdown.cancel();
    }

    /// Processes one inbound event.
    ///
    /// # Errors
    ///
    /// Returns an error if the processor is shutting down or if candidate
    /// workflows could not be loaded. Action failures are not errors; they
    /// are reported in the returned [`EventOutcome`].
    #[instrument(
        skip_all,
        fields(trigger_type = %trigger_type, tenant_id = %tenant_id, correlation_id = %correlation_id)
    )]
    pub async fn process_event(
        &self,
        trigger_type: TriggerType,
        payload: &JsonValue,
        tenant_id: &TenantId,
        correlation_id: &CorrelationId,
    ) -> Result<EventOutcome, Report<EngineError>> {
        if self.shutdown.is_cancelled() {
            return Err(EngineError::ShuttingDown.into());
        }

        let workflows = match self
            .store
            .find_active_by_trigger(trigger_type, tenant_id)
            .await
        {
            Ok(workflows) => workflows,
            Err(e) => {
                tracing::error!(error = %e, "failed to load workflows");
                self.audit
                    .write(
                        AuditRecord::error(
                            ENGINE_SOURCE,
                            "PROCESS_ERROR",
                            format!("Failed to process {trigger_type} event: {e}"),
                            correlation_id.clone(),
                        )
                        .with_tenant(tenant_id.clone()),
                    )
                    .await;
                return Err(EngineError::WorkflowLookup {
                    trigger_type: trigger_type.to_string(),
                    tenant_id: tenant_id.to_string(),
                    details: e.to_string(),
                }
                .into());
            }
        };

        let mut outcome = EventOutcome::default();
        for workflow in workflows {
            if !workflow.is_active()
                || workflow.tenant_id != *tenant_id
                || workflow.trigger.trigger_type != trigger_type
            {
                tracing::warn!(workflow_id = %workflow.id, "store returned a non-candidate workflow");
                continue;
            }
            let result = self
                .run_workflow(&workflow, payload, tenant_id, correlation_id)
                .await;
            outcome.workflows.push(result);
        }

        tracing::debug!(
            candidates = outcome.workflows.len(),
            matched = outcome.matched().count(),
            "event processed"
        );
        Ok(outcome)
    }

    async fn run_workflow(
        &self,
        workflow: &Workflow,
        payload: &JsonValue,
        tenant_id: &TenantId,
        correlation_id: &CorrelationId,
    ) -> WorkflowOutcome {
        let started = Instant::now();
        let matched = workflow.trigger.matches(payload);
        if let Some(node_id) = &workflow.trigger.node_id {
            let status = if matched {
                TelemetryStatus::Success
            } else {
                TelemetryStatus::Skipped
            };
            self.emit(
                workflow,
                node_id,
                NodeType::Trigger,
                status,
                started.elapsed(),
                correlation_id,
                None,
            )
            .await;
        }

        let mut outcome = WorkflowOutcome {
            workflow_id: workflow.id,
            name: workflow.name.clone(),
            matched,
            actions: Vec::new(),
        };
        if !matched {
            return outcome;
        }

        let context = WorkflowContext::new(
            workflow.id,
            tenant_id.clone(),
            correlation_id.clone(),
            payload.clone(),
        )
        .with_cancellation(self.shutdown.child_token());

        for action in &workflow.actions {
            let result = self.run_action(workflow, action, &context).await;
            outcome.actions.push(ActionOutcome {
                action_type: action.action_type(),
                node_id: action.node_id.clone(),
                result,
            });
        }

        self.audit
            .write(
                AuditRecord::info(
                    ENGINE_SOURCE,
                    "EXECUTE_WORKFLOW",
                    format!(
                        "Executed workflow \"{}\" for tenant {}",
                        workflow.name, tenant_id
                    ),
                    correlation_id.clone(),
                )
                .with_tenant(tenant_id.clone())
                .with_details(json!({
                    "workflowId": workflow.id,
                    "actions": outcome.actions.len(),
                })),
            )
            .await;

        outcome
    }

    async fn run_action(
        &self,
        workflow: &Workflow,
        action: &Action,
        context: &WorkflowContext,
    ) -> ActionResult {
        let started = Instant::now();
        let dispatch = self.registry.dispatch(action, context);
        // A delay is bounded by its own duration and the shutdown token.
        let limit = self
            .handler_timeout
            .filter(|_| action.action_type() != ActionType::Delay);
        let result = match limit {
            Some(limit) => match tokio::time::timeout(limit, dispatch).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        workflow_id = %workflow.id,
                        action_type = %action.action_type(),
                        "action timed out"
                    );
                    ActionResult::failed(format!(
                        "Action timed out after {}ms",
                        limit.as_millis()
                    ))
                }
            },
            None => dispatch.await,
        };
        let elapsed = started.elapsed();

        if let Some(node_id) = &action.node_id {
            let status = match result.status {
                ActionStatus::Success => TelemetryStatus::Success,
                ActionStatus::Failed => TelemetryStatus::Failed,
            };
            self.emit(
                workflow,
                node_id,
                NodeType::Action,
                status,
                elapsed,
                &context.correlation_id,
                result.error_message.clone(),
            )
            .await;
        }

        if result.is_success() {
            self.audit
                .write(
                    AuditRecord::info(
                        ENGINE_SOURCE,
                        "ACTION_EXECUTED",
                        format!("Executed {} action", action.action_type()),
                        context.correlation_id.clone(),
                    )
                    .with_tenant(context.tenant_id.clone())
                    .with_details(json!({
                        "workflowId": workflow.id,
                        "nodeId": action.node_id,
                        "output": result.output,
                    })),
                )
                .await;
        } else {
            tracing::warn!(
                workflow_id = %workflow.id,
                action_type = %action.action_type(),
                error = ?result.error_message,
                "action failed, continuing"
            );
        }

        result
    }

    #[allow(clippy::too_many_arguments)]
    async fn emit(
        &self,
        workflow: &Workflow,
        node_id: &str,
        node_type: NodeType,
        status: TelemetryStatus,
        elapsed: Duration,
        correlation_id: &CorrelationId,
        error: Option<String>,
    ) {
        let event = TelemetryEvent {
            workflow_id: workflow.id,
            node_id: node_id.to_string(),
            tenant_id: workflow.tenant_id.clone(),
            node_type,
            status,
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            correlation_id: correlation_id.clone(),
            error,
            timestamp: Utc::now(),
        };
        if let Err(e) = self.telemetry.record(event).await {
            tracing::warn!(workflow_id = %workflow.id, node_id, error = %e, "telemetry not recorded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Params;
    use crate::error::{StoreError, TelemetryError};
    use crate::handler::{ActionHandler, DelayHandler, LogHandler};
    use crate::memory::{InMemoryTelemetry, InMemoryWorkflowStore};
    use crate::state_machine::{EntityType, WorkflowDefinition};
    use crate::trigger::{Condition, Operator, Trigger};
    use async_trait::async_trait;
    use ruleflow_core::MemoryAuditSink;
    use std::sync::Mutex;

    /// Records the order in which actions ran, failing on request.
    struct Recording {
        action_type: ActionType,
        calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl ActionHandler for Recording {
        fn action_type(&self) -> ActionType {
            self.action_type
        }

        async fn execute(&self, action: &Action, _context: &WorkflowContext) -> ActionResult {
            let name = action.param_str("name").unwrap_or_default().to_string();
            self.calls.lock().unwrap().push(name.clone());
            if action.param("fail").is_some() {
                ActionResult::failed(format!("{name} failed"))
            } else {
                ActionResult::success()
            }
        }
    }

    /// Never completes.
    struct Stuck;

    #[async_trait]
    impl ActionHandler for Stuck {
        fn action_type(&self) -> ActionType {
            ActionType::Branch
        }

        async fn execute(&self, _action: &Action, _context: &WorkflowContext) -> ActionResult {
            std::future::pending().await
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl WorkflowStore for BrokenStore {
        async fn find_active_by_trigger(
            &self,
            _trigger_type: TriggerType,
            _tenant_id: &TenantId,
        ) -> Result<Vec<Workflow>, StoreError> {
            Err(StoreError::Unavailable {
                details: "connection refused".to_string(),
            })
        }

        async fn get_definition(
            &self,
            _tenant_id: &TenantId,
            _entity_type: EntityType,
        ) -> Result<Option<WorkflowDefinition>, StoreError> {
            Ok(None)
        }

        async fn list_definitions(
            &self,
            _tenant_id: &TenantId,
        ) -> Result<Vec<WorkflowDefinition>, StoreError> {
            Ok(Vec::new())
        }
    }

    struct BrokenTelemetry;

    #[async_trait]
    impl TelemetryRecorder for BrokenTelemetry {
        async fn record(&self, _event: TelemetryEvent) -> Result<(), TelemetryError> {
            Err(TelemetryError::RecordFailed {
                details: "sink offline".to_string(),
            })
        }
    }

    fn tenant() -> TenantId {
        TenantId::new("acme")
    }

    fn correlation() -> CorrelationId {
        CorrelationId::new("corr-42")
    }

    fn risk_workflow() -> Workflow {
        Workflow::new(
            tenant(),
            "Escalate high risk",
            Trigger::new(
                TriggerType::OnRisk,
                Condition::new("riskScore", Operator::Gt, json!(75)),
            )
            .with_node_id("trigger"),
        )
    }

    fn named(name: &str, fail: bool) -> Action {
        let mut params = Params::new();
        params.insert("name".to_string(), json!(name));
        if fail {
            params.insert("fail".to_string(), json!(true));
        }
        Action::with_params(ActionType::Notify, params).with_node_id(name)
    }

    struct Harness {
        processor: EventProcessor,
        telemetry: Arc<InMemoryTelemetry>,
        audit: Arc<MemoryAuditSink>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    fn harness(workflows: Vec<Workflow>) -> Harness {
        let store = Arc::new(InMemoryWorkflowStore::with_workflows(workflows));
        let telemetry = Arc::new(InMemoryTelemetry::new());
        let audit = Arc::new(MemoryAuditSink::new());
        let calls = Arc::new(Mutex::new(Vec::new()));

        let mut registry = ActionRegistry::new();
        registry.register(Arc::new(Recording {
            action_type: ActionType::Notify,
            calls: calls.clone(),
        }));
        registry.register(Arc::new(LogHandler::new(audit.clone())));
        registry.register(Arc::new(DelayHandler::new()));
        registry.register(Arc::new(Stuck));

        let processor = EventProcessor::new(store, registry, telemetry.clone(), audit.clone());
        Harness {
            processor,
            telemetry,
            audit,
            calls,
        }
    }

    #[tokio::test]
    async fn matching_event_runs_actions_in_order_with_telemetry() {
        let workflow = risk_workflow()
            .with_action(named("first", false))
            .with_action(named("second", false))
            .with_action(named("third", false));
        let h = harness(vec![workflow]);

        let outcome = h
            .processor
            .process_event(
                TriggerType::OnRisk,
                &json!({"riskScore": 80}),
                &tenant(),
                &correlation(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.matched().count(), 1);
        assert_eq!(*h.calls.lock().unwrap(), vec!["first", "second", "third"]);

        let events = h.telemetry.events();
        let summary: Vec<_> = events
            .iter()
            .map(|e| (e.node_type, e.node_id.as_str(), e.status))
            .collect();
        assert_eq!(
            summary,
            vec![
                (NodeType::Trigger, "trigger", TelemetryStatus::Success),
                (NodeType::Action, "first", TelemetryStatus::Success),
                (NodeType::Action, "second", TelemetryStatus::Success),
                (NodeType::Action, "third", TelemetryStatus::Success),
            ]
        );
        assert!(events.iter().all(|e| e.correlation_id == correlation()));

        let actions = h.audit.actions();
        assert_eq!(actions.last().map(String::as_str), Some("EXECUTE_WORKFLOW"));
        assert_eq!(
            actions.iter().filter(|a| *a == "ACTION_EXECUTED").count(),
            3
        );
        let summary_record = h.audit.records().pop().unwrap();
        assert_eq!(
            summary_record.message,
            "Executed workflow \"Escalate high risk\" for tenant acme"
        );
    }

    #[tokio::test]
    async fn non_matching_event_emits_skipped_trigger_only() {
        let h = harness(vec![risk_workflow().with_action(named("first", false))]);

        let outcome = h
            .processor
            .process_event(
                TriggerType::OnRisk,
                &json!({"riskScore": 30}),
                &tenant(),
                &correlation(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.matched().count(), 0);
        assert!(h.calls.lock().unwrap().is_empty());
        let events = h.telemetry.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, TelemetryStatus::Skipped);
        assert!(h.audit.records().is_empty());
    }

    #[tokio::test]
    async fn failed_action_does_not_stop_the_chain() {
        let first = risk_workflow()
            .with_action(named("a1", false))
            .with_action(named("a2", true))
            .with_action(named("a3", false));
        let second = risk_workflow().with_action(named("b1", false));
        let h = harness(vec![first, second]);

        let outcome = h
            .processor
            .process_event(
                TriggerType::OnRisk,
                &json!({"riskScore": 99}),
                &tenant(),
                &correlation(),
            )
            .await
            .unwrap();

        assert_eq!(*h.calls.lock().unwrap(), vec!["a1", "a2", "a3", "b1"]);
        assert_eq!(outcome.failed_actions(), 1);
        let failed = h
            .telemetry
            .events()
            .into_iter()
            .find(|e| e.node_id == "a2")
            .unwrap();
        assert_eq!(failed.status, TelemetryStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("a2 failed"));
    }

    #[tokio::test]
    async fn unregistered_action_type_fails_and_continues() {
        let workflow = risk_workflow()
            .with_action(Action::with_params(ActionType::Iterator, Params::new()))
            .with_action(named("after", false));
        let h = harness(vec![workflow]);

        let outcome = h
            .processor
            .process_event(
                TriggerType::OnRisk,
                &json!({"riskScore": 90}),
                &tenant(),
                &correlation(),
            )
            .await
            .unwrap();

        let actions = &outcome.workflows[0].actions;
        assert_eq!(
            actions[0].result.error_message.as_deref(),
            Some("No handler found for action type: iterator")
        );
        assert!(actions[1].result.is_success());
    }

    #[tokio::test]
    async fn workflows_of_other_tenants_are_not_run() {
        let mut foreign = risk_workflow().with_action(named("foreign", false));
        foreign.tenant_id = TenantId::new("globex");
        let h = harness(vec![foreign]);

        let outcome = h
            .processor
            .process_event(
                TriggerType::OnRisk,
                &json!({"riskScore": 90}),
                &tenant(),
                &correlation(),
            )
            .await
            .unwrap();

        assert!(outcome.workflows.is_empty());
        assert!(h.calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn delay_action_suspends_the_chain() {
        let mut params = Params::new();
        params.insert("duration".to_string(), json!(2));
        params.insert("unit".to_string(), json!("s"));
        let workflow = risk_workflow()
            .with_action(Action::with_params(ActionType::Delay, params).with_node_id("wait"))
            .with_action(named("after", false));
        let h = harness(vec![workflow]);

        let start = Instant::now();
        let outcome = h
            .processor
            .process_event(
                TriggerType::OnRisk,
                &json!({"riskScore": 90}),
                &tenant(),
                &correlation(),
            )
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_secs(2));
        assert_eq!(outcome.failed_actions(), 0);
        let wait = h
            .telemetry
            .events()
            .into_iter()
            .find(|e| e.node_id == "wait")
            .unwrap();
        assert!(wait.duration_ms >= 2000);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_longer_than_handler_timeout_succeeds() {
        let mut params = Params::new();
        params.insert("duration".to_string(), json!(10));
        params.insert("unit".to_string(), json!("m"));
        let workflow = risk_workflow()
            .with_action(Action::with_params(ActionType::Delay, params).with_node_id("wait"))
            .with_action(named("after", false));
        let h = harness(vec![workflow]);
        let processor = h.processor.with_config(&EngineConfig::default());

        let start = Instant::now();
        let outcome = processor
            .process_event(
                TriggerType::OnRisk,
                &json!({"riskScore": 90}),
                &tenant(),
                &correlation(),
            )
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_secs(600));
        let actions = &outcome.workflows[0].actions;
        assert!(actions[0].result.is_success());
        assert_eq!(outcome.failed_actions(), 0);
        assert_eq!(*h.calls.lock().unwrap(), vec!["after"]);
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_handler_times_out_and_chain_continues() {
        let workflow = risk_workflow()
            .with_action(Action::with_params(ActionType::Branch, Params::new()))
            .with_action(named("after", false));
        let h = harness(vec![workflow]);
        let processor = h
            .processor
            .with_handler_timeout(Some(Duration::from_millis(500)));

        let outcome = processor
            .process_event(
                TriggerType::OnRisk,
                &json!({"riskScore": 90}),
                &tenant(),
                &correlation(),
            )
            .await
            .unwrap();

        let actions = &outcome.workflows[0].actions;
        assert_eq!(
            actions[0].result.error_message.as_deref(),
            Some("Action timed out after 500ms")
        );
        assert_eq!(*h.calls.lock().unwrap(), vec!["after"]);
    }

    #[tokio::test]
    async fn store_failure_is_audited_and_returned() {
        let audit = Arc::new(MemoryAuditSink::new());
        let processor = EventProcessor::new(
            Arc::new(BrokenStore),
            ActionRegistry::new(),
            Arc::new(InMemoryTelemetry::new()),
            audit.clone(),
        );

        let err = processor
            .process_event(TriggerType::OnEvent, &json!({}), &tenant(), &correlation())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("connection refused"));
        assert_eq!(audit.actions(), vec!["PROCESS_ERROR"]);
    }

    #[tokio::test]
    async fn telemetry_failure_does_not_abort_processing() {
        let store = Arc::new(InMemoryWorkflowStore::with_workflows(vec![
            risk_workflow().with_action(Action::with_params(ActionType::Log, Params::new())),
        ]));
        let audit = Arc::new(MemoryAuditSink::new());
        let mut registry = ActionRegistry::new();
        registry.register(Arc::new(LogHandler::new(audit.clone())));
        let processor =
            EventProcessor::new(store, registry, Arc::new(BrokenTelemetry), audit.clone());

        let outcome = processor
            .process_event(
                TriggerType::OnRisk,
                &json!({"riskScore": 90}),
                &tenant(),
                &correlation(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.matched().count(), 1);
        assert_eq!(
            audit.actions(),
            vec!["AUTOMATED_ALERT", "ACTION_EXECUTED", "EXECUTE_WORKFLOW"]
        );
    }

    #[tokio::test]
    async fn shutdown_rejects_new_events() {
        let h = harness(vec![risk_workflow()]);
        h.processor.shutdown();

        let err = h
            .processor
            .process_event(
                TriggerType::OnRisk,
                &json!({"riskScore": 90}),
                &tenant(),
                &correlation(),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("shutting down"));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_inflight_delay() {
        let mut params = Params::new();
        params.insert("duration".to_string(), json!(10));
        params.insert("unit".to_string(), json!("m"));
        let workflow = risk_workflow()
            .with_action(Action::with_params(ActionType::Delay, params))
            .with_action(named("after", false));
        let h = harness(vec![workflow]);
        let token = h.processor.shutdown_token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });

        let outcome = h
            .processor
            .process_event(
                TriggerType::OnRisk,
                &json!({"riskScore": 90}),
                &tenant(),
                &correlation(),
            )
            .await
            .unwrap();

        let actions = &outcome.workflows[0].actions;
        assert_eq!(
            actions[0].result.error_message.as_deref(),
            Some("Delay cancelled")
        );
        assert_eq!(*h.calls.lock().unwrap(), vec!["after"]);
    }
}
