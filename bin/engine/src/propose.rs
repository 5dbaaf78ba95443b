//! Proposal commands backed by the configured LLM.

use crate::config::AppConfig;
use crate::error::CliError;
use crate::run::Fixture;
use rootcause::prelude::Report;
use ruleflow_ai::{OllamaBackend, TenantPromptSource};
use ruleflow_core::{CorrelationId, TenantId, TracingAuditSink};
use ruleflow_proposal::{
    DefinitionRequest, ProposalOrchestrator, Suggestion, SuggestionRequest,
};
use ruleflow_workflow::{EntityType, StructuralValidator, WorkflowDefinition, WorkflowStore};
use std::path::Path;
use std::sync::Arc;

fn orchestrator(config: &AppConfig) -> Result<ProposalOrchestrator, Report<CliError>> {
    let backend = OllamaBackend::new(&config.llm).map_err(|e| CliError::Llm {
        details: e.to_string(),
    })?;
    Ok(ProposalOrchestrator::new(
        Arc::new(backend),
        Arc::new(TenantPromptSource::new()),
        Arc::new(StructuralValidator),
        Arc::new(TracingAuditSink),
    )
    .with_config(config.proposal.clone()))
}

/// Drafts a definition and returns it.
///
/// # Errors
///
/// Returns an error if the LLM cannot be reached or the draft is rejected.
pub async fn propose(
    config: &AppConfig,
    tenant: &str,
    entity_type: EntityType,
    industry: Option<String>,
    description: &str,
) -> Result<WorkflowDefinition, Report<CliError>> {
    let mut request = DefinitionRequest::new(
        TenantId::new(tenant),
        entity_type,
        description,
        CorrelationId::generate(),
    );
    request.industry = industry;

    orchestrator(config)?
        .propose_definition(&request)
        .await
        .map_err(|e| {
            CliError::Proposal {
                details: e.to_string(),
            }
            .into()
        })
}

/// Asks whether one of the tenant's definitions in `definitions` covers the
/// need.
///
/// # Errors
///
/// Returns an error if the fixture cannot be read, the LLM cannot be
/// reached, or its answer is rejected.
pub async fn suggest(
    config: &AppConfig,
    tenant: &str,
    entity_type: EntityType,
    industry: Option<String>,
    definitions: Option<&Path>,
    description: &str,
) -> Result<Suggestion, Report<CliError>> {
    let tenant_id = TenantId::new(tenant);
    let existing = match definitions {
        Some(path) => existing_definitions(Fixture::load(path).await?, &tenant_id, entity_type)
            .await?,
        None => Vec::new(),
    };

    let mut request =
        SuggestionRequest::new(tenant_id, entity_type, description, CorrelationId::generate())
            .with_existing(existing);
    request.industry = industry;

    orchestrator(config)?
        .suggest_workflow(&request)
        .await
        .map_err(|e| {
            CliError::Proposal {
                details: e.to_string(),
            }
            .into()
        })
}

async fn existing_definitions(
    fixture: Fixture,
    tenant_id: &TenantId,
    entity_type: EntityType,
) -> Result<Vec<WorkflowDefinition>, Report<CliError>> {
    let store = fixture.into_store();
    let definitions = store
        .list_definitions(tenant_id)
        .await
        .map_err(|e| CliError::InvalidInput {
            details: e.to_string(),
        })?;
    Ok(definitions
        .into_iter()
        .filter(|d| d.entity_type == entity_type)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ruleflow_workflow::State;

    fn definition(tenant: &str, entity_type: EntityType, name: &str) -> WorkflowDefinition {
        WorkflowDefinition::draft(TenantId::new(tenant), "GENERIC", name, entity_type, "open")
            .with_state(State::new("open", "Open"))
    }

    #[tokio::test]
    async fn existing_definitions_are_scoped_to_tenant_and_entity_type() {
        let fixture = Fixture {
            definitions: vec![
                definition("acme", EntityType::Equipment, "Repair"),
                definition("acme", EntityType::User, "Onboarding"),
                definition("globex", EntityType::Equipment, "Other tenant"),
            ],
            ..Fixture::default()
        };

        let found = existing_definitions(fixture, &TenantId::new("acme"), EntityType::Equipment)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Repair");
    }
}
