//! In-memory collaborators.
//!
//! Suitable for single-process deployments, the CLI and tests. Data does
//! not survive a restart.

use crate::definition::Workflow;
use crate::error::{StoreError, TelemetryError};
use crate::state_machine::{EntityType, WorkflowDefinition};
use crate::store::{EntityStore, TaskStore, WorkflowStore};
use crate::task::WorkflowTask;
use crate::telemetry::{TelemetryEvent, TelemetryRecorder};
use crate::trigger::TriggerType;
use async_trait::async_trait;
use ruleflow_core::TenantId;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

type EntityKey = (TenantId, String, String);

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Unavailable {
        details: "lock poisoned".to_string(),
    }
}

/// Workflow, task and entity store backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryWorkflowStore {
    workflows: RwLock<Vec<Workflow>>,
    definitions: RwLock<Vec<WorkflowDefinition>>,
    tasks: Mutex<Vec<WorkflowTask>>,
    entities: RwLock<HashMap<EntityKey, JsonValue>>,
    entity_writes: AtomicUsize,
}

impl InMemoryWorkflowStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given workflows.
    #[must_use]
    pub fn with_workflows(workflows: Vec<Workflow>) -> Self {
        Self {
            workflows: RwLock::new(workflows),
            ..Self::default()
        }
    }

    /// Adds or replaces a workflow by id.
    pub fn insert_workflow(&self, workflow: Workflow) {
        let mut workflows = self.workflows.write().unwrap_or_else(PoisonError::into_inner);
        workflows.retain(|w| w.id != workflow.id);
        workflows.push(workflow);
    }

    /// Adds or replaces a definition by id.
    pub fn insert_definition(&self, definition: WorkflowDefinition) {
        let mut definitions = self
            .definitions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        definitions.retain(|d| d.id != definition.id);
        definitions.push(definition);
    }

    /// Seeds an entity document.
    pub fn insert_entity(&self, tenant_id: &TenantId, entity_slug: &str, id: &str, doc: JsonValue) {
        self.entities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                (tenant_id.clone(), entity_slug.to_string(), id.to_string()),
                doc,
            );
    }

    /// Returns a copy of an entity document.
    #[must_use]
    pub fn entity(&self, tenant_id: &TenantId, entity_slug: &str, id: &str) -> Option<JsonValue> {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(tenant_id.clone(), entity_slug.to_string(), id.to_string()))
            .cloned()
    }

    /// Returns the number of successful entity updates.
    #[must_use]
    pub fn entity_writes(&self) -> usize {
        self.entity_writes.load(Ordering::SeqCst)
    }

    /// Returns the tasks of a tenant, in creation order.
    #[must_use]
    pub fn tasks(&self, tenant_id: &TenantId) -> Vec<WorkflowTask> {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|t| t.tenant_id == *tenant_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn find_active_by_trigger(
        &self,
        trigger_type: TriggerType,
        tenant_id: &TenantId,
    ) -> Result<Vec<Workflow>, StoreError> {
        let workflows = self.workflows.read().map_err(poisoned)?;
        Ok(workflows
            .iter()
            .filter(|w| {
                w.is_active() && w.tenant_id == *tenant_id && w.trigger.trigger_type == trigger_type
            })
            .cloned()
            .collect())
    }

    async fn get_definition(
        &self,
        tenant_id: &TenantId,
        entity_type: EntityType,
    ) -> Result<Option<WorkflowDefinition>, StoreError> {
        let definitions = self.definitions.read().map_err(poisoned)?;
        let mut candidates: Vec<&WorkflowDefinition> = definitions
            .iter()
            .filter(|d| d.tenant_id == *tenant_id && d.entity_type == entity_type)
            .collect();
        // Prefer the tenant default, then the most recent version.
        candidates.sort_by_key(|d| (d.is_default, d.active, d.version));
        Ok(candidates.last().map(|d| (*d).clone()))
    }

    async fn list_definitions(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<WorkflowDefinition>, StoreError> {
        let definitions = self.definitions.read().map_err(poisoned)?;
        Ok(definitions
            .iter()
            .filter(|d| d.tenant_id == *tenant_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TaskStore for InMemoryWorkflowStore {
    async fn create_task(&self, task: WorkflowTask) -> Result<(), StoreError> {
        let mut tasks = self.tasks.lock().map_err(poisoned)?;
        if tasks.iter().any(|t| t.id == task.id) {
            return Err(StoreError::Conflict {
                details: format!("task {} already exists", task.id),
            });
        }
        tasks.push(task);
        Ok(())
    }
}

#[async_trait]
impl EntityStore for InMemoryWorkflowStore {
    async fn update_entity(
        &self,
        entity_slug: &str,
        id: &str,
        updates: &JsonValue,
        tenant_id: &TenantId,
    ) -> Result<(), StoreError> {
        let mut entities = self.entities.write().map_err(poisoned)?;
        let key = (tenant_id.clone(), entity_slug.to_string(), id.to_string());
        let Some(doc) = entities.get_mut(&key) else {
            return Err(StoreError::EntityNotFound {
                entity_slug: entity_slug.to_string(),
                id: id.to_string(),
            });
        };

        match (doc.as_object_mut(), updates.as_object()) {
            (Some(fields), Some(changes)) => {
                for (field, value) in changes {
                    fields.insert(field.clone(), value.clone());
                }
            }
            _ => *doc = updates.clone(),
        }
        self.entity_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Telemetry sink that keeps events in memory, in emission order.
#[derive(Debug, Default)]
pub struct InMemoryTelemetry {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl InMemoryTelemetry {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl TelemetryRecorder for InMemoryTelemetry {
    async fn record(&self, event: TelemetryEvent) -> Result<(), TelemetryError> {
        self.events
            .lock()
            .map_err(|_| TelemetryError::RecordFailed {
                details: "lock poisoned".to_string(),
            })?
            .push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::{Condition, Operator, Trigger};
    use serde_json::json;

    fn workflow(tenant: &str, trigger_type: TriggerType) -> Workflow {
        Workflow::new(
            TenantId::new(tenant),
            "w",
            Trigger::new(trigger_type, Condition::new("x", Operator::Eq, json!(1))),
        )
    }

    #[tokio::test]
    async fn find_active_is_tenant_and_trigger_scoped() {
        let mut inactive = workflow("acme", TriggerType::OnRisk);
        inactive.deactivate();
        let store = InMemoryWorkflowStore::with_workflows(vec![
            workflow("acme", TriggerType::OnRisk),
            workflow("acme", TriggerType::OnInsight),
            workflow("globex", TriggerType::OnRisk),
            inactive,
        ]);

        let found = store
            .find_active_by_trigger(TriggerType::OnRisk, &TenantId::new("acme"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].tenant_id, TenantId::new("acme"));
    }

    #[tokio::test]
    async fn get_definition_prefers_default() {
        let store = InMemoryWorkflowStore::new();
        let tenant = TenantId::new("acme");
        let mut default =
            WorkflowDefinition::draft(tenant.clone(), "GENERIC", "Default", EntityType::User, "a");
        default.is_default = true;
        store.insert_definition(default);
        store.insert_definition(WorkflowDefinition::draft(
            tenant.clone(),
            "GENERIC",
            "Other",
            EntityType::User,
            "a",
        ));

        let found = store
            .get_definition(&tenant, EntityType::User)
            .await
            .unwrap();
        assert_eq!(found.map(|d| d.name), Some("Default".to_string()));
        assert!(
            store
                .get_definition(&tenant, EntityType::Equipment)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn entity_updates_are_tenant_scoped() {
        let store = InMemoryWorkflowStore::new();
        store.insert_entity(&TenantId::new("acme"), "cases", "1", json!({"a": 1}));

        let err = store
            .update_entity("cases", "1", &json!({"a": 2}), &TenantId::new("globex"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::EntityNotFound { .. }));
        assert_eq!(store.entity_writes(), 0);
    }
}
