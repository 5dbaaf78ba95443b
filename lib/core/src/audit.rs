//! Structured audit trail.
//!
//! Audit records are the durable, user-visible log of what the engine did:
//! which workflow ran, which alert a Log action raised, which proposal
//! failed validation. They are distinct from diagnostic `tracing` output,
//! although [`TracingAuditSink`] forwards them there when no durable sink
//! is configured.

use crate::id::{CorrelationId, TenantId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::{Mutex, PoisonError};

/// Severity of an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// A single audit trail entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub level: AuditLevel,
    /// Component that produced the record (e.g. `AI_WORKFLOW_ENGINE`).
    pub source: String,
    /// Machine-readable action code (e.g. `EXECUTE_WORKFLOW`).
    pub action: String,
    pub message: String,
    pub correlation_id: CorrelationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<TenantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    /// Creates a record at the given level.
    #[must_use]
    pub fn new(
        level: AuditLevel,
        source: impl Into<String>,
        action: impl Into<String>,
        message: impl Into<String>,
        correlation_id: CorrelationId,
    ) -> Self {
        Self {
            level,
            source: source.into(),
            action: action.into(),
            message: message.into(),
            correlation_id,
            tenant_id: None,
            details: None,
            timestamp: Utc::now(),
        }
    }

    /// Creates an INFO record.
    #[must_use]
    pub fn info(
        source: impl Into<String>,
        action: impl Into<String>,
        message: impl Into<String>,
        correlation_id: CorrelationId,
    ) -> Self {
        Self::new(AuditLevel::Info, source, action, message, correlation_id)
    }

    /// Creates a WARN record.
    #[must_use]
    pub fn warn(
        source: impl Into<String>,
        action: impl Into<String>,
        message: impl Into<String>,
        correlation_id: CorrelationId,
    ) -> Self {
        Self::new(AuditLevel::Warn, source, action, message, correlation_id)
    }

    /// Creates an ERROR record.
    #[must_use]
    pub fn error(
        source: impl Into<String>,
        action: impl Into<String>,
        message: impl Into<String>,
        correlation_id: CorrelationId,
    ) -> Self {
        Self::new(AuditLevel::Error, source, action, message, correlation_id)
    }

    /// Scopes the record to a tenant.
    #[must_use]
    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    /// Attaches structured details.
    #[must_use]
    pub fn with_details(mut self, details: JsonValue) -> Self {
        self.details = Some(details);
        self
    }
}

/// Destination for audit records.
///
/// Writing never fails from the caller's point of view: a sink that cannot
/// persist a record is expected to report that through its own diagnostics.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Appends a record to the audit trail.
    async fn write(&self, record: AuditRecord);
}

/// Audit sink that forwards every record to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn write(&self, record: AuditRecord) {
        let details = record
            .details
            .as_ref()
            .map(JsonValue::to_string)
            .unwrap_or_default();
        let tenant_id = record.tenant_id.as_ref().map(TenantId::as_str);

        match record.level {
            AuditLevel::Debug => tracing::debug!(
                source = %record.source,
                action = %record.action,
                correlation_id = %record.correlation_id,
                tenant_id = ?tenant_id,
                details = %details,
                "{}",
                record.message
            ),
            AuditLevel::Info => tracing::info!(
                source = %record.source,
                action = %record.action,
                correlation_id = %record.correlation_id,
                tenant_id = ?tenant_id,
                details = %details,
                "{}",
                record.message
            ),
            AuditLevel::Warn => tracing::warn!(
                source = %record.source,
                action = %record.action,
                correlation_id = %record.correlation_id,
                tenant_id = ?tenant_id,
                details = %details,
                "{}",
                record.message
            ),
            AuditLevel::Error => tracing::error!(
                source = %record.source,
                action = %record.action,
                correlation_id = %record.correlation_id,
                tenant_id = ?tenant_id,
                details = %details,
                "{}",
                record.message
            ),
        }
    }
}

/// Audit sink that keeps records in memory, in write order.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all records written so far.
    #[must_use]
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the action codes of all records, in write order.
    #[must_use]
    pub fn actions(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.action).collect()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn write(&self, record: AuditRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}
