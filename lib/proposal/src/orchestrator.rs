//! Workflow proposal orchestrator.
//!
//! Both entry points run the same pipeline: render a prompt (tenant template
//! first, master template on failure), call the model, then parse and check
//! its answer. Drafting a definition additionally assembles it and runs the
//! structural validator. Each request writes START and SUCCESS or ERROR
//! audit records.

use crate::assemble::assemble;
use crate::config::ProposalConfig;
use crate::error::{ProposalError, ProposalStage};
use crate::schema::{Proposal, Suggestion};
use crate::templates::{WORKFLOW_GENERATOR, WORKFLOW_ROUTER, master_template};
use ruleflow_ai::{
    LlmBackend, LlmRequest, PromptSource, RenderedPrompt, Variables, extract_json_object,
};
use ruleflow_core::{AuditRecord, AuditSink, CorrelationId, TenantId};
use ruleflow_workflow::{
    DefinitionValidator, EntityType, ValidationContext, ValidationError, ValidationReport,
    WorkflowDefinition,
};
use rootcause::prelude::Report;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Audit source of proposal records.
pub const PROPOSAL_SOURCE: &str = "WORKFLOW_ORCHESTRATOR";

/// Asks whether an existing definition covers a need.
#[derive(Debug, Clone)]
pub struct SuggestionRequest {
    pub tenant_id: TenantId,
    pub entity_type: EntityType,
    pub description: String,
    /// The tenant's current definitions, offered to the model for reuse.
    pub existing_workflows: Vec<WorkflowDefinition>,
    pub industry: Option<String>,
    pub correlation_id: CorrelationId,
}

impl SuggestionRequest {
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        entity_type: EntityType,
        description: impl Into<String>,
        correlation_id: CorrelationId,
    ) -> Self {
        Self {
            tenant_id,
            entity_type,
            description: description.into(),
            existing_workflows: Vec::new(),
            industry: None,
            correlation_id,
        }
    }

    #[must_use]
    pub fn with_existing(mut self, workflows: Vec<WorkflowDefinition>) -> Self {
        self.existing_workflows = workflows;
        self
    }

    #[must_use]
    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }
}

/// Asks for a new definition drafted from a description.
#[derive(Debug, Clone)]
pub struct DefinitionRequest {
    pub tenant_id: TenantId,
    pub entity_type: EntityType,
    pub description: String,
    pub industry: Option<String>,
    pub correlation_id: CorrelationId,
}

impl DefinitionRequest {
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        entity_type: EntityType,
        description: impl Into<String>,
        correlation_id: CorrelationId,
    ) -> Self {
        Self {
            tenant_id,
            entity_type,
            description: description.into(),
            industry: None,
            correlation_id,
        }
    }

    #[must_use]
    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }
}

fn summarize(workflows: &[WorkflowDefinition]) -> String {
    let summaries: Vec<JsonValue> = workflows
        .iter()
        .map(|w| {
            let states: Vec<&str> = w.states.iter().map(|s| s.label.as_str()).collect();
            json!({
                "id": w.id.to_string(),
                "name": w.name,
                "entityType": w.entity_type,
                "stateCount": w.states.len(),
                "states": states.join(" → "),
            })
        })
        .collect();
    serde_json::to_string_pretty(&summaries).unwrap_or_else(|_| "[]".to_string())
}

fn variables(pairs: impl IntoIterator<Item = (&'static str, String)>) -> Variables {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), JsonValue::String(v)))
        .collect()
}

/// Drafts workflow suggestions and definitions with an LLM.
pub struct ProposalOrchestrator {
    llm: Arc<dyn LlmBackend>,
    prompts: Arc<dyn PromptSource>,
    validator: Arc<dyn DefinitionValidator>,
    audit: Arc<dyn AuditSink>,
    config: ProposalConfig,
}

impl ProposalOrchestrator {
    /// Creates an orchestrator with default configuration.
    #[must_use]
    pub fn new(
        llm: Arc<dyn LlmBackend>,
        prompts: Arc<dyn PromptSource>,
        validator: Arc<dyn DefinitionValidator>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            llm,
            prompts,
            validator,
            audit,
            config: ProposalConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ProposalConfig) -> Self {
        self.config = config;
        self
    }

    /// Asks the model whether to reuse an existing definition or draft a new one.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be called or its answer does not
    /// match the suggestion schema. The failure is audited before returning.
    #[instrument(
        skip_all,
        fields(tenant_id = %request.tenant_id, correlation_id = %request.correlation_id, entity_type = %request.entity_type)
    )]
    pub async fn suggest_workflow(
        &self,
        request: &SuggestionRequest,
    ) -> Result<Suggestion, Report<ProposalError>> {
        self.audit
            .write(
                AuditRecord::info(
                    PROPOSAL_SOURCE,
                    "SUGGEST_WORKFLOW_START",
                    format!("Starting workflow suggestion for {}", request.entity_type),
                    request.correlation_id.clone(),
                )
                .with_tenant(request.tenant_id.clone())
                .with_details(json!({
                    "entityType": request.entity_type,
                    "workflowCount": request.existing_workflows.len(),
                })),
            )
            .await;

        match self.try_suggest(request).await {
            Ok(suggestion) => {
                self.audit
                    .write(
                        AuditRecord::info(
                            PROPOSAL_SOURCE,
                            "SUGGEST_WORKFLOW_SUCCESS",
                            format!("Workflow suggested successfully: {:?}", suggestion.action),
                            request.correlation_id.clone(),
                        )
                        .with_tenant(request.tenant_id.clone())
                        .with_details(json!({
                            "action": suggestion.action,
                            "confidence": suggestion.confidence,
                        })),
                    )
                    .await;
                Ok(suggestion)
            }
            Err(e) => {
                self.audit_failure(
                    "SUGGEST_WORKFLOW_ERROR",
                    "Error suggesting workflow",
                    &e,
                    &request.tenant_id,
                    &request.correlation_id,
                )
                .await;
                Err(e.into())
            }
        }
    }

    /// Drafts a complete definition from a description.
    ///
    /// The result is an inactive draft at version 1 that passed structural
    /// validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be called, its answer does not
    /// match the proposal schema, or the assembled definition is
    /// structurally invalid. The failure is audited before returning.
    #[instrument(
        skip_all,
        fields(tenant_id = %request.tenant_id, correlation_id = %request.correlation_id, entity_type = %request.entity_type)
    )]
    pub async fn propose_definition(
        &self,
        request: &DefinitionRequest,
    ) -> Result<WorkflowDefinition, Report<ProposalError>> {
        self.audit
            .write(
                AuditRecord::info(
                    PROPOSAL_SOURCE,
                    "PROPOSE_DEFINITION_START",
                    format!("Proposing workflow definition for {}", request.entity_type),
                    request.correlation_id.clone(),
                )
                .with_tenant(request.tenant_id.clone())
                .with_details(json!({
                    "entityType": request.entity_type,
                    "description": request.description,
                })),
            )
            .await;

        match self.try_propose(request).await {
            Ok((definition, report)) => {
                self.audit
                    .write(
                        AuditRecord::info(
                            PROPOSAL_SOURCE,
                            "PROPOSE_DEFINITION_SUCCESS",
                            format!(
                                "Workflow definition proposed successfully: {}",
                                definition.name
                            ),
                            request.correlation_id.clone(),
                        )
                        .with_tenant(request.tenant_id.clone())
                        .with_details(json!({
                            "name": definition.name,
                            "stateCount": definition.states.len(),
                            "transitionCount": definition.transitions.len(),
                            "warnings": report.warnings.len(),
                        })),
                    )
                    .await;
                Ok(definition)
            }
            Err(e) => {
                self.audit_failure(
                    "PROPOSE_DEFINITION_ERROR",
                    "Error proposing workflow definition",
                    &e,
                    &request.tenant_id,
                    &request.correlation_id,
                )
                .await;
                Err(e.into())
            }
        }
    }

    async fn try_suggest(&self, request: &SuggestionRequest) -> Result<Suggestion, ProposalError> {
        let industry = self.config.industry(request.industry.as_deref());
        let vars = variables([
            ("vertical", industry.clone()),
            ("industry", industry),
            ("entityType", request.entity_type.to_string()),
            ("description", request.description.clone()),
            ("existingWorkflows", summarize(&request.existing_workflows)),
        ]);

        let prompt = self
            .render_prompt(
                WORKFLOW_ROUTER,
                &vars,
                &request.tenant_id,
                &request.correlation_id,
            )
            .await?;
        let text = self
            .call_model(
                prompt,
                self.config.router_temperature,
                &request.tenant_id,
                &request.correlation_id,
            )
            .await?;

        Suggestion::from_value(extract_json_object(&text)?)
    }

    async fn try_propose(
        &self,
        request: &DefinitionRequest,
    ) -> Result<(WorkflowDefinition, ValidationReport), ProposalError> {
        let industry = self.config.industry(request.industry.as_deref());
        let vars = variables([
            ("vertical", industry.clone()),
            ("industry", industry.clone()),
            ("entityType", request.entity_type.to_string()),
            ("description", request.description.clone()),
        ]);

        let prompt = self
            .render_prompt(
                WORKFLOW_GENERATOR,
                &vars,
                &request.tenant_id,
                &request.correlation_id,
            )
            .await?;
        let text = self
            .call_model(
                prompt,
                self.config.generator_temperature,
                &request.tenant_id,
                &request.correlation_id,
            )
            .await?;
        let proposal = Proposal::from_value(extract_json_object(&text)?)?;

        debug!(
            stage = %ProposalStage::Assemble,
            states = proposal.states.len(),
            transitions = proposal.transitions.len(),
            "assembling definition"
        );
        let definition = assemble(proposal, request.tenant_id.clone(), &industry);

        let report = self
            .validator
            .validate(
                &definition,
                &ValidationContext::new(request.tenant_id.clone(), request.correlation_id.clone()),
            )
            .await;
        if !report.is_valid() {
            return Err(ProposalError::InvalidDefinition(ValidationError::new(
                "Generated workflow definition is invalid",
                report.errors,
                report.warnings,
            )));
        }

        Ok((definition, report))
    }

    /// Renders the tenant's template, falling back to the master template.
    async fn render_prompt(
        &self,
        key: &str,
        vars: &Variables,
        tenant_id: &TenantId,
        correlation_id: &CorrelationId,
    ) -> Result<RenderedPrompt, ProposalError> {
        let tenant_error = match self.prompts.render(key, vars, tenant_id).await {
            Ok(prompt) => return Ok(prompt),
            Err(e) => e,
        };

        warn!(key, error = %tenant_error, "falling back to master prompt");
        self.audit
            .write(
                AuditRecord::warn(
                    PROPOSAL_SOURCE,
                    "PROMPT_FALLBACK",
                    format!("Fallback to Master Prompt for {key}: {tenant_error}"),
                    correlation_id.clone(),
                )
                .with_tenant(tenant_id.clone())
                .with_details(json!({ "error": tenant_error.to_string() })),
            )
            .await;

        let master = master_template(key).ok_or_else(|| ProposalError::PromptUnavailable {
            key: key.to_string(),
            details: "no master template".to_string(),
        })?;
        master
            .render_checked(vars)
            .map_err(|e| ProposalError::PromptUnavailable {
                key: key.to_string(),
                details: e.to_string(),
            })
    }

    async fn call_model(
        &self,
        prompt: RenderedPrompt,
        temperature: f32,
        tenant_id: &TenantId,
        correlation_id: &CorrelationId,
    ) -> Result<String, ProposalError> {
        let mut request = LlmRequest::new(prompt.text)
            .with_temperature(temperature)
            .for_tenant(tenant_id.clone(), correlation_id.clone());
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }

        let response = self.llm.generate(&request).await?;
        debug!(
            model = %response.model,
            tokens = response.usage.total(),
            "model answered"
        );
        Ok(response.content)
    }

    async fn audit_failure(
        &self,
        action: &str,
        prefix: &str,
        error: &ProposalError,
        tenant_id: &TenantId,
        correlation_id: &CorrelationId,
    ) {
        tracing::error!(stage = %error.stage(), error = %error, "{prefix}");

        let mut details = json!({
            "error": error.to_string(),
            "stage": error.stage().as_str(),
        });
        if let ProposalError::InvalidDefinition(validation) = error {
            details["errors"] = json!(validation.errors);
            details["warnings"] = json!(validation.warnings);
        }

        self.audit
            .write(
                AuditRecord::error(
                    PROPOSAL_SOURCE,
                    action,
                    format!("{prefix}: {error}"),
                    correlation_id.clone(),
                )
                .with_tenant(tenant_id.clone())
                .with_details(details),
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ruleflow_ai::{
        LlmError, LlmProvider, LlmResponse, PromptTemplate, TenantPromptSource, TokenUsage,
    };
    use ruleflow_core::{AuditLevel, MemoryAuditSink};
    use ruleflow_workflow::{DefinitionStatus, State, StructuralValidator};
    use std::sync::Mutex;

    struct ScriptedLlm {
        reply: Result<String, LlmError>,
        requests: Mutex<Vec<LlmRequest>>,
    }

    impl ScriptedLlm {
        fn requests(&self) -> Vec<LlmRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmBackend for ScriptedLlm {
        async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
            self.requests.lock().unwrap().push(request.clone());
            self.reply.clone().map(|content| LlmResponse {
                content,
                usage: TokenUsage::default(),
                model: "scripted".to_string(),
            })
        }

        fn provider(&self) -> LlmProvider {
            LlmProvider::Ollama
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    struct Harness {
        llm: Arc<ScriptedLlm>,
        prompts: Arc<TenantPromptSource>,
        audit: Arc<MemoryAuditSink>,
        orchestrator: ProposalOrchestrator,
    }

    fn harness(reply: Result<&str, LlmError>) -> Harness {
        let llm = Arc::new(ScriptedLlm {
            reply: reply.map(str::to_string),
            requests: Mutex::new(Vec::new()),
        });
        let prompts = Arc::new(TenantPromptSource::new());
        let audit = Arc::new(MemoryAuditSink::new());
        let orchestrator = ProposalOrchestrator::new(
            llm.clone(),
            prompts.clone(),
            Arc::new(StructuralValidator),
            audit.clone(),
        );
        Harness {
            llm,
            prompts,
            audit,
            orchestrator,
        }
    }

    const INSPECTION: &str = r##"```json
{
  "name": "Elevator inspection",
  "entityType": "EQUIPMENT",
  "states": [
    {"id": "scheduled", "label": "Scheduled", "is_initial": true},
    {"id": "inspected", "label": "Inspected", "requires_validation": true},
    {"id": "certified", "label": "Certified", "is_final": true, "color": "#16a34a"}
  ],
  "transitions": [
    {"from": "scheduled", "to": "inspected", "label": "Inspect"},
    {"from": "inspected", "to": "certified", "label": "Certify",
     "conditions": {"require_signature": true, "min_documents": 1}}
  ],
  "initial_state": "scheduled"
}
```"##;

    fn definition_request() -> DefinitionRequest {
        DefinitionRequest::new(
            TenantId::new("acme"),
            EntityType::Equipment,
            "Yearly inspection of elevators",
            CorrelationId::new("corr-1"),
        )
        .with_industry("elevators")
    }

    #[tokio::test]
    async fn propose_definition_uses_tenant_template() {
        let h = harness(Ok(INSPECTION));
        h.prompts.register(
            TenantId::new("acme"),
            PromptTemplate::new(
                WORKFLOW_GENERATOR,
                "Draft {{entityType}} for {{industry}}: {{description}}",
            ),
        );

        let def = h
            .orchestrator
            .propose_definition(&definition_request())
            .await
            .unwrap();

        let requests = h.llm.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].prompt,
            "Draft EQUIPMENT for ELEVATORS: Yearly inspection of elevators"
        );
        assert_eq!(requests[0].temperature, Some(0.4));
        assert_eq!(requests[0].tenant_id, Some(TenantId::new("acme")));

        assert_eq!(def.name, "Elevator inspection");
        assert_eq!(def.industry, "ELEVATORS");
        assert_eq!(def.status, DefinitionStatus::Draft);
        assert!(!def.active);
        assert_eq!(def.version, 1);
        assert_eq!(def.states[0].color, "#64748b");
        assert_eq!(def.states[2].color, "#16a34a");
        assert!(def.transitions[1].conditions.require_signature);

        assert_eq!(
            h.audit.actions(),
            vec!["PROPOSE_DEFINITION_START", "PROPOSE_DEFINITION_SUCCESS"]
        );
    }

    #[tokio::test]
    async fn missing_tenant_template_falls_back_to_master() {
        let h = harness(Ok(INSPECTION));

        h.orchestrator
            .propose_definition(&definition_request())
            .await
            .unwrap();

        let records = h.audit.records();
        let fallback = records
            .iter()
            .find(|r| r.action == "PROMPT_FALLBACK")
            .unwrap();
        assert_eq!(fallback.level, AuditLevel::Warn);
        assert!(fallback.message.contains(WORKFLOW_GENERATOR));

        let request = &h.llm.requests()[0];
        assert!(request.prompt.contains("Yearly inspection of elevators"));
        assert!(request.prompt.contains("ELEVATORS industry"));
        assert!(request.system.as_deref().unwrap().contains("JSON"));
    }

    #[tokio::test]
    async fn invalid_initial_state_is_a_validation_error() {
        let bad = INSPECTION.replace(
            r#""initial_state": "scheduled""#,
            r#""initial_state": "draft""#,
        );
        let h = harness(Ok(bad.as_str()));

        let err = h
            .orchestrator
            .propose_definition(&definition_request())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Generated workflow definition is invalid"));
        assert!(err.to_string().contains("Initial state 'draft'"));

        let last = h.audit.records().pop().unwrap();
        assert_eq!(last.action, "PROPOSE_DEFINITION_ERROR");
        assert_eq!(last.level, AuditLevel::Error);
        let details = last.details.unwrap();
        assert_eq!(details["stage"], "STRUCTURAL_VALIDATE");
        assert_eq!(details["errors"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unparseable_output_fails_at_parse_stage() {
        let h = harness(Ok("I would suggest three states."));

        let err = h
            .orchestrator
            .propose_definition(&definition_request())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid model output"));

        let details = h.audit.records().pop().unwrap().details.unwrap();
        assert_eq!(details["stage"], "PARSE_AND_VALIDATE_LLM_OUTPUT");
    }

    #[tokio::test]
    async fn model_failure_is_audited_and_returned() {
        let h = harness(Err(LlmError::Timeout));

        let err = h
            .orchestrator
            .propose_definition(&definition_request())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));

        let details = h.audit.records().pop().unwrap().details.unwrap();
        assert_eq!(details["stage"], "CALL_MODEL");
    }

    fn existing() -> WorkflowDefinition {
        WorkflowDefinition::draft(
            TenantId::new("acme"),
            "ELEVATORS",
            "Repair",
            EntityType::Equipment,
            "open",
        )
        .with_state(State::new("open", "Open"))
        .with_state(State::new("fixed", "Fixed").final_state())
    }

    #[tokio::test]
    async fn suggest_workflow_reuses_existing_definition() {
        let current = existing();
        let answer = format!(
            r#"{{"action": "USE_EXISTING", "workflowId": "{}", "reason": "same process", "confidence": 0.914}}"#,
            current.id
        );
        let h = harness(Ok(answer.as_str()));

        let request = SuggestionRequest::new(
            TenantId::new("acme"),
            EntityType::Equipment,
            "Track repairs",
            CorrelationId::new("corr-2"),
        )
        .with_existing(vec![current.clone()]);
        let suggestion = h.orchestrator.suggest_workflow(&request).await.unwrap();

        assert_eq!(suggestion.workflow_id, Some(current.id.to_string()));
        assert!((suggestion.confidence - 0.91).abs() < 1e-9);

        let sent = &h.llm.requests()[0];
        assert_eq!(sent.temperature, Some(0.3));
        assert!(sent.prompt.contains("Open → Fixed"));
        assert!(sent.prompt.contains("GENERIC industry"));
        assert_eq!(
            h.audit.actions(),
            vec![
                "SUGGEST_WORKFLOW_START",
                "PROMPT_FALLBACK",
                "SUGGEST_WORKFLOW_SUCCESS"
            ]
        );
    }

    #[tokio::test]
    async fn suggest_workflow_rejects_reuse_without_id() {
        let h = harness(Ok(r#"{"action": "USE_EXISTING", "confidence": 0.8}"#));

        let request = SuggestionRequest::new(
            TenantId::new("acme"),
            EntityType::Entity,
            "Anything",
            CorrelationId::new("corr-3"),
        );
        let err = h.orchestrator.suggest_workflow(&request).await.unwrap_err();
        assert!(err.to_string().contains("workflowId"));
        assert_eq!(
            h.audit.actions().last().map(String::as_str),
            Some("SUGGEST_WORKFLOW_ERROR")
        );
    }
}
