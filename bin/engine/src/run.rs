//! Event replay: feeds NDJSON events through an in-memory engine.

use crate::config::AppConfig;
use crate::error::CliError;
use rootcause::prelude::Report;
use ruleflow_core::{AuditSink, CorrelationId, TenantId, TracingAuditSink};
use ruleflow_governance::{PolicyGovernance, PolicyRule};
use ruleflow_workflow::{
    ActionRegistry, AnomalyMonitor, EventProcessor, InMemoryTelemetry,
    InMemoryWorkflowStore, TelemetryStatus, TriggerType, Workflow, WorkflowDefinition,
};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Contents of a fixture file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    #[serde(default)]
    pub workflows: Vec<Workflow>,
    #[serde(default)]
    pub definitions: Vec<WorkflowDefinition>,
    /// Governance rules, first match wins.
    #[serde(default)]
    pub policies: Vec<PolicyRule>,
    /// Deny mutations no rule allows. Allowed by default.
    #[serde(default)]
    pub deny_by_default: bool,
}

impl Fixture {
    /// Reads a fixture file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid fixture.
    pub async fn load(path: &Path) -> Result<Self, Report<CliError>> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CliError::Io {
                target: path.display().to_string(),
                details: e.to_string(),
            })?;
        let fixture = serde_json::from_str(&content).map_err(|e| CliError::InvalidInput {
            details: format!("{}: {e}", path.display()),
        })?;
        Ok(fixture)
    }

    fn governance(&self) -> PolicyGovernance {
        let base = if self.deny_by_default {
            PolicyGovernance::deny_by_default()
        } else {
            PolicyGovernance::allow_by_default()
        };
        self.policies
            .iter()
            .cloned()
            .fold(base, PolicyGovernance::with_rule)
    }

    /// Builds a store holding the fixture's workflows and definitions.
    #[must_use]
    pub fn into_store(self) -> InMemoryWorkflowStore {
        let store = InMemoryWorkflowStore::with_workflows(self.workflows);
        for definition in self.definitions {
            store.insert_definition(definition);
        }
        store
    }
}

/// One inbound event line.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEvent {
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,
    pub tenant_id: TenantId,
    #[serde(default)]
    pub correlation_id: Option<CorrelationId>,
    #[serde(default)]
    pub payload: JsonValue,
}

/// Counters of a replay.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub processed: usize,
    pub rejected: usize,
    pub failed_actions: usize,
}

/// In-memory engine assembled from a fixture.
pub struct Engine {
    pub processor: EventProcessor,
    pub store: Arc<InMemoryWorkflowStore>,
    pub telemetry: Arc<InMemoryTelemetry>,
}

impl Engine {
    /// Wires the standard handlers against in-memory collaborators.
    #[must_use]
    pub fn from_fixture(fixture: Fixture, config: &AppConfig) -> Self {
        let governance = Arc::new(fixture.governance());
        let store = Arc::new(fixture.into_store());
        let telemetry = Arc::new(InMemoryTelemetry::new());
        let audit: Arc<dyn AuditSink> = Arc::new(TracingAuditSink);

        let registry = ActionRegistry::standard(
            &config.engine,
            audit.clone(),
            store.clone(),
            store.clone(),
            governance,
        );
        let monitor = AnomalyMonitor::new(
            telemetry.clone(),
            audit.clone(),
            config.engine.anomaly_thresholds(),
        );
        let processor = EventProcessor::new(store.clone(), registry, Arc::new(monitor), audit)
            .with_config(&config.engine);

        Self {
            processor,
            store,
            telemetry,
        }
    }

    /// Processes events line by line until input ends or shutdown.
    ///
    /// Each processed event's outcome is written to `output` as one JSON
    /// line. Malformed lines are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input or writing output fails, or the
    /// store cannot be read.
    pub async fn replay<R, W>(
        &self,
        input: R,
        output: &mut W,
    ) -> Result<ReplaySummary, Report<CliError>>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let shutdown = self.processor.shutdown_token();
        let mut lines = input.lines();
        let mut summary = ReplaySummary::default();

        loop {
            let line = tokio::select! {
                () = shutdown.cancelled() => break,
                line = lines.next_line() => line.map_err(|e| CliError::Io {
                    target: "stdin".to_string(),
                    details: e.to_string(),
                })?,
            };
            let Some(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }

            let event: InboundEvent = match serde_json::from_str(&line) {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed event line");
                    summary.rejected += 1;
                    continue;
                }
            };
            let correlation_id = event
                .correlation_id
                .unwrap_or_else(CorrelationId::generate);

            let outcome = match self
                .processor
                .process_event(
                    event.trigger_type,
                    &event.payload,
                    &event.tenant_id,
                    &correlation_id,
                )
                .await
            {
                Ok(outcome) => outcome,
                Err(_) if shutdown.is_cancelled() => break,
                Err(e) => {
                    return Err(CliError::Engine {
                        details: e.to_string(),
                    }
                    .into());
                }
            };

            summary.processed += 1;
            summary.failed_actions += outcome.failed_actions();

            let mut json = serde_json::to_string(&outcome).map_err(|e| CliError::InvalidInput {
                details: e.to_string(),
            })?;
            json.push('\n');
            output
                .write_all(json.as_bytes())
                .await
                .map_err(|e| CliError::Io {
                    target: "stdout".to_string(),
                    details: e.to_string(),
                })?;
        }

        output.flush().await.map_err(|e| CliError::Io {
            target: "stdout".to_string(),
            details: e.to_string(),
        })?;
        Ok(summary)
    }
}

/// Runs the `run` command against stdin and stdout.
///
/// # Errors
///
/// Returns an error if the fixture cannot be loaded or replay fails.
pub async fn run(workflows: &Path, config: &AppConfig) -> Result<(), Report<CliError>> {
    let fixture = Fixture::load(workflows).await?;
    tracing::info!(
        workflows = fixture.workflows.len(),
        definitions = fixture.definitions.len(),
        policies = fixture.policies.len(),
        "loaded fixture"
    );

    let engine = Engine::from_fixture(fixture, config);

    let shutdown = engine.processor.shutdown_token();
    let signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received");
            shutdown.cancel();
        }
    });

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let result = engine.replay(stdin, &mut stdout).await;
    signal.abort();
    let summary = result?;

    let events = engine.telemetry.events();
    tracing::info!(
        processed = summary.processed,
        rejected = summary.rejected,
        failed_actions = summary.failed_actions,
        telemetry_events = events.len(),
        telemetry_failures = events
            .iter()
            .filter(|e| e.status == TelemetryStatus::Failed)
            .count(),
        "replay finished"
    );
    Ok(())
}
