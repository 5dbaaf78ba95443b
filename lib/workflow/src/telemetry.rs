//! Per-node execution telemetry.
//!
//! Every trigger evaluation and every action execution that carries a node
//! id produces one [`TelemetryEvent`]. Recording is best-effort: the event
//! processor logs recorder failures and keeps going.

use crate::error::TelemetryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ruleflow_core::{AuditRecord, AuditSink, CorrelationId, TenantId, WorkflowId};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

/// Which kind of node produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Trigger,
    Action,
}

/// Outcome of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TelemetryStatus {
    Success,
    Skipped,
    Failed,
}

/// One append-only telemetry record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent {
    pub workflow_id: WorkflowId,
    pub node_id: String,
    pub tenant_id: TenantId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub status: TelemetryStatus,
    pub duration_ms: u64,
    pub correlation_id: CorrelationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Durable sink for telemetry events.
#[async_trait]
pub trait TelemetryRecorder: Send + Sync {
    /// Appends an event.
    ///
    /// # Errors
    ///
    /// Returns an error if the event could not be stored.
    async fn record(&self, event: TelemetryEvent) -> Result<(), TelemetryError>;
}

/// Thresholds for [`AnomalyMonitor`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyThresholds {
    /// Number of recent events kept per node.
    pub window: usize,
    /// Minimum events in the window before a rate is meaningful.
    pub min_samples: usize,
    /// Failure ratio at or above which an anomaly is raised.
    pub error_rate: f64,
    /// Recent average duration must exceed the node's baseline by this factor.
    pub latency_factor: f64,
    /// Recent average durations at or below this are never a spike.
    pub latency_floor_ms: u64,
    /// Number of nodes tracked before the least recently seen is evicted.
    pub max_nodes: usize,
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            window: 50,
            min_samples: 10,
            error_rate: 0.15,
            latency_factor: 2.0,
            latency_floor_ms: 500,
            max_nodes: 10_000,
        }
    }
}

/// Aggregated execution statistics of one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStats {
    pub node_id: String,
    pub count: u64,
    pub avg_duration_ms: f64,
    pub error_rate: f64,
}

/// Something the monitor found worth reporting.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Anomaly {
    ErrorRate { rate: f64, samples: usize },
    LatencySpike { recent_avg_ms: f64, baseline_avg_ms: f64 },
}

type NodeKey = (TenantId, WorkflowId, String);

#[derive(Debug, Default)]
struct NodeHistory {
    recent: VecDeque<(TelemetryStatus, u64)>,
    count: u64,
    failed: u64,
    total_duration_ms: u64,
    last_seen: u64,
}

impl NodeHistory {
    fn baseline_avg_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_duration_ms as f64 / self.count as f64
        }
    }

    fn stats(&self, node_id: &str) -> NodeStats {
        NodeStats {
            node_id: node_id.to_string(),
            count: self.count,
            avg_duration_ms: self.baseline_avg_ms(),
            error_rate: if self.count == 0 {
                0.0
            } else {
                self.failed as f64 / self.count as f64
            },
        }
    }
}

#[derive(Debug, Default)]
struct History {
    nodes: HashMap<NodeKey, NodeHistory>,
    clock: u64,
}

/// Recorder decorator that watches per-node health.
///
/// Each event is forwarded to the inner recorder first. The monitor keeps a
/// bounded window of recent events per node plus lifetime totals, which serve
/// as the latency baseline. When a FAILED event arrives it checks the node:
/// a failure ratio over the threshold writes an ERROR audit record, and a
/// recent average duration well above the baseline writes a WARN one.
///
/// At most `max_nodes` nodes are tracked; past that the least recently seen
/// node is forgotten, statistics included.
pub struct AnomalyMonitor {
    inner: Arc<dyn TelemetryRecorder>,
    audit: Arc<dyn AuditSink>,
    thresholds: AnomalyThresholds,
    history: Mutex<History>,
}

impl AnomalyMonitor {
    #[must_use]
    pub fn new(
        inner: Arc<dyn TelemetryRecorder>,
        audit: Arc<dyn AuditSink>,
        thresholds: AnomalyThresholds,
    ) -> Self {
        Self {
            inner,
            audit,
            thresholds,
            history: Mutex::new(History::default()),
        }
    }

    /// Returns the statistics of every tracked node of a workflow, ordered by
    /// node id.
    #[must_use]
    pub fn node_stats(&self, tenant_id: &TenantId, workflow_id: WorkflowId) -> Vec<NodeStats> {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stats: Vec<NodeStats> = history
            .nodes
            .iter()
            .filter(|((tenant, workflow, _), _)| tenant == tenant_id && *workflow == workflow_id)
            .map(|((_, _, node_id), node)| node.stats(node_id))
            .collect();
        stats.sort_by(|a, b| a.node_id.cmp(&b.node_id));
        stats
    }

    /// Adds the event to the node's history and returns what should be
    /// reported.
    fn observe(&self, event: &TelemetryEvent) -> Vec<Anomaly> {
        let key = (
            event.tenant_id.clone(),
            event.workflow_id,
            event.node_id.clone(),
        );
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.clock += 1;
        let clock = history.clock;

        if !history.nodes.contains_key(&key)
            && history.nodes.len() >= self.thresholds.max_nodes.max(1)
        {
            let oldest = history
                .nodes
                .iter()
                .min_by_key(|(_, node)| node.last_seen)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                history.nodes.remove(&oldest);
            }
        }

        let node = history.nodes.entry(key).or_default();
        node.last_seen = clock;
        node.count += 1;
        node.total_duration_ms = node.total_duration_ms.saturating_add(event.duration_ms);
        if event.status == TelemetryStatus::Failed {
            node.failed += 1;
        }
        node.recent.push_back((event.status, event.duration_ms));
        while node.recent.len() > self.thresholds.window.max(1) {
            node.recent.pop_front();
        }

        if event.status != TelemetryStatus::Failed {
            return Vec::new();
        }

        let mut anomalies = Vec::new();
        let samples = node.recent.len();

        if samples >= self.thresholds.min_samples {
            let failed = node
                .recent
                .iter()
                .filter(|(status, _)| *status == TelemetryStatus::Failed)
                .count();
            let rate = failed as f64 / samples as f64;
            if rate >= self.thresholds.error_rate {
                anomalies.push(Anomaly::ErrorRate { rate, samples });
            }
        }

        let recent_avg_ms =
            node.recent.iter().map(|(_, ms)| *ms as f64).sum::<f64>() / samples as f64;
        let baseline_avg_ms = node.baseline_avg_ms();
        if recent_avg_ms > baseline_avg_ms * self.thresholds.latency_factor
            && recent_avg_ms > self.thresholds.latency_floor_ms as f64
        {
            anomalies.push(Anomaly::LatencySpike {
                recent_avg_ms,
                baseline_avg_ms,
            });
        }

        anomalies
    }

    fn audit_record(
        anomaly: Anomaly,
        workflow_id: WorkflowId,
        node_id: &str,
        correlation_id: CorrelationId,
    ) -> AuditRecord {
        match anomaly {
            Anomaly::ErrorRate { rate, samples } => {
                tracing::error!(
                    %workflow_id,
                    node_id,
                    rate,
                    "node failure rate above threshold"
                );
                AuditRecord::error(
                    "WORKFLOW_ANALYTICS",
                    "ANOMALY_DETECTED",
                    format!(
                        "Node {node_id} of workflow {workflow_id} is failing {:.0}% of the last {samples} executions",
                        rate * 100.0
                    ),
                    correlation_id,
                )
                .with_details(json!({
                    "workflowId": workflow_id,
                    "nodeId": node_id,
                    "errorRate": rate,
                    "type": "ERROR_SPIKE",
                }))
            }
            Anomaly::LatencySpike {
                recent_avg_ms,
                baseline_avg_ms,
            } => {
                tracing::warn!(
                    %workflow_id,
                    node_id,
                    recent_avg_ms,
                    baseline_avg_ms,
                    "node latency above baseline"
                );
                AuditRecord::warn(
                    "WORKFLOW_ANALYTICS",
                    "LATENCY_SPIKE",
                    format!(
                        "Node {node_id} in workflow {workflow_id} is slower than usual ({recent_avg_ms:.0}ms vs baseline {baseline_avg_ms:.0}ms)"
                    ),
                    correlation_id,
                )
                .with_details(json!({
                    "workflowId": workflow_id,
                    "nodeId": node_id,
                    "recentAvgDuration": recent_avg_ms,
                    "baselineAvg": baseline_avg_ms,
                    "type": "LATENCY_SPIKE",
                }))
            }
        }
    }
}

#[async_trait]
impl TelemetryRecorder for AnomalyMonitor {
    async fn record(&self, event: TelemetryEvent) -> Result<(), TelemetryError> {
        let anomalies = self.observe(&event);
        let tenant_id = event.tenant_id.clone();
        let correlation_id = event.correlation_id.clone();
        let workflow_id = event.workflow_id;
        let node_id = event.node_id.clone();

        let result = self.inner.record(event).await;

        for anomaly in anomalies {
            let record =
                Self::audit_record(anomaly, workflow_id, &node_id, correlation_id.clone())
                    .with_tenant(tenant_id.clone());
            self.audit.write(record).await;
        }

        result
    }
}
