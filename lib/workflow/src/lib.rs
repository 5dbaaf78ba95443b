//! Workflow automation engine for ruleflow.
//!
//! This crate provides the event-triggered rules system:
//!
//! - **Model**: triggers, actions, automation workflows, human tasks and
//!   design-time state-machine definitions
//! - **Trigger evaluation**: a pure predicate over event payloads
//! - **Handlers**: six built-in action handlers behind a type-keyed registry
//! - **Event processing**: sequential, continue-on-failure execution of
//!   matched workflows with per-node telemetry and an audit trail
//! - **Validation**: structural checks for state-machine definitions

pub mod action;
pub mod config;
pub mod definition;
pub mod error;
pub mod handler;
pub mod memory;
pub mod orchestrator;
pub mod state_machine;
pub mod store;
pub mod task;
pub mod telemetry;
pub mod trigger;
pub mod validator;

pub use action::{Action, ActionKind, ActionResult, ActionStatus, ActionType, HumanTaskParams, Params};
pub use config::EngineConfig;
pub use definition::Workflow;
pub use error::{EngineError, StoreError, TelemetryError, ValidationError};
pub use handler::{ActionHandler, ActionRegistry, WorkflowContext};
pub use memory::{InMemoryTelemetry, InMemoryWorkflowStore};
pub use orchestrator::{ActionOutcome, EventOutcome, EventProcessor, WorkflowOutcome};
pub use state_machine::{
    DecisionStrategy, DefinitionStatus, EntityType, Environment, State, Transition,
    TransitionConditions, WorkflowDefinition,
};
pub use store::{EntityStore, TaskStore, WorkflowStore};
pub use task::{TaskMetadata, TaskPriority, TaskStatus, WorkflowTask};
pub use telemetry::{
    AnomalyMonitor, AnomalyThresholds, NodeStats, NodeType, TelemetryEvent, TelemetryRecorder,
    TelemetryStatus,
};
pub use trigger::{Condition, Operator, Trigger, TriggerType, evaluate};
pub use validator::{DefinitionValidator, StructuralValidator, ValidationContext, ValidationReport};
