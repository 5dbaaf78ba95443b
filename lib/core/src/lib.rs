//! Core domain types and utilities for the ruleflow automation engine.
//!
//! This crate provides the foundational types shared by every other crate:
//! strongly-typed identifiers, the rootcause-backed `Result` alias, and the
//! structured audit trail that handlers and orchestrators write to.

pub mod audit;
pub mod error;
pub mod id;

pub use audit::{AuditLevel, AuditRecord, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use error::Result;
pub use id::{CorrelationId, DefinitionId, ParseIdError, TaskId, TenantId, WorkflowId};
