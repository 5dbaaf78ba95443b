//! Error types for the workflow crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `StoreError`, `TelemetryError`: collaborator failures, returned plain
//!   from the store and telemetry traits
//! - `EngineError`: event processing failures, wrapped in a `Report` by the
//!   event processor
//! - `ValidationError`: structural problems in a workflow definition

use std::fmt;

/// Errors from a workflow, task or entity store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached or failed internally.
    Unavailable { details: String },
    /// The entity to update does not exist.
    EntityNotFound { entity_slug: String, id: String },
    /// A record with the same id already exists.
    Conflict { details: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { details } => write!(f, "store unavailable: {details}"),
            Self::EntityNotFound { entity_slug, id } => {
                write!(f, "entity not found: {entity_slug}/{id}")
            }
            Self::Conflict { details } => write!(f, "store conflict: {details}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors from a telemetry sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    /// The event could not be recorded.
    RecordFailed { details: String },
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RecordFailed { details } => write!(f, "failed to record telemetry: {details}"),
        }
    }
}

impl std::error::Error for TelemetryError {}

/// Errors from event processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Loading candidate workflows failed.
    WorkflowLookup {
        trigger_type: String,
        tenant_id: String,
        details: String,
    },
    /// The engine is shutting down and no longer accepts events.
    ShuttingDown,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WorkflowLookup {
                trigger_type,
                tenant_id,
                details,
            } => {
                write!(
                    f,
                    "failed to load {trigger_type} workflows for tenant {tenant_id}: {details}"
                )
            }
            Self::ShuttingDown => write!(f, "engine is shutting down"),
        }
    }
}

impl std::error::Error for EngineError {}

/// A workflow definition failed structural validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationError {
    /// Creates a validation error from the validator's findings.
    #[must_use]
    pub fn new(message: impl Into<String>, errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            message: message.into(),
            errors,
            warnings,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if !self.errors.is_empty() {
            write!(f, ": {}", self.errors.join("; "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        let err = StoreError::EntityNotFound {
            entity_slug: "elevators".to_string(),
            id: "42".to_string(),
        };
        assert_eq!(err.to_string(), "entity not found: elevators/42");
    }

    #[test]
    fn engine_error_display() {
        let err = EngineError::WorkflowLookup {
            trigger_type: "on_risk".to_string(),
            tenant_id: "acme".to_string(),
            details: "store unavailable: timeout".to_string(),
        };
        assert!(err.to_string().contains("on_risk"));
        assert!(err.to_string().contains("acme"));
    }

    #[test]
    fn validation_error_lists_errors() {
        let err = ValidationError::new(
            "Workflow definition is invalid",
            vec!["no states".to_string(), "empty name".to_string()],
            Vec::new(),
        );
        assert_eq!(
            err.to_string(),
            "Workflow definition is invalid: no states; empty name"
        );
    }
}
