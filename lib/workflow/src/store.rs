//! Persistence contracts consumed by the engine.
//!
//! Every call is tenant-scoped: the tenant id is an explicit partition key
//! and implementations must never return another tenant's data.

use crate::definition::Workflow;
use crate::error::StoreError;
use crate::state_machine::{EntityType, WorkflowDefinition};
use crate::task::WorkflowTask;
use crate::trigger::TriggerType;
use async_trait::async_trait;
use ruleflow_core::TenantId;
use serde_json::Value as JsonValue;

/// Source of automation workflows and state-machine definitions.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Returns the active workflows of a tenant listening to a trigger type.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    async fn find_active_by_trigger(
        &self,
        trigger_type: TriggerType,
        tenant_id: &TenantId,
    ) -> Result<Vec<Workflow>, StoreError>;

    /// Returns the tenant's definition for an entity type, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    async fn get_definition(
        &self,
        tenant_id: &TenantId,
        entity_type: EntityType,
    ) -> Result<Option<WorkflowDefinition>, StoreError>;

    /// Returns every definition of a tenant, for routing prompts.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    async fn list_definitions(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<WorkflowDefinition>, StoreError>;
}

/// Sink for human tasks.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persists a newly created task.
    ///
    /// # Errors
    ///
    /// Returns an error if the task cannot be stored.
    async fn create_task(&self, task: WorkflowTask) -> Result<(), StoreError>;
}

/// Generic entity mutation.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Merges `updates` into the entity `entity_slug/id` of the tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity does not exist or cannot be written.
    async fn update_entity(
        &self,
        entity_slug: &str,
        id: &str,
        updates: &JsonValue,
        tenant_id: &TenantId,
    ) -> Result<(), StoreError>;
}
