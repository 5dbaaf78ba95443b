//! Prompt templates and tenant prompt sources.
//!
//! Templates use `{{variable}}` placeholders. A [`PromptSource`] resolves a
//! template key for a tenant and renders it; callers fall back to their own
//! compiled-in templates when the source fails.

use crate::error::PromptError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ruleflow_core::TenantId;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Template variables.
pub type Variables = HashMap<String, JsonValue>;

/// A versioned prompt template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Template key (used for lookup).
    pub name: String,
    /// Semantic version.
    pub version: String,
    /// Template content with placeholders.
    pub content: String,
    /// Optional system prompt template.
    pub system_prompt: Option<String>,
    /// Description of what this template is for.
    pub description: Option<String>,
    /// Variable definitions (name -> definition).
    pub variables: HashMap<String, VariableDefinition>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Definition of a template variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDefinition {
    /// Description of what this variable is for.
    pub description: String,
    /// Whether this variable is required.
    pub required: bool,
    /// Default value if not provided.
    pub default: Option<JsonValue>,
}

impl VariableDefinition {
    /// Creates a required variable definition.
    #[must_use]
    pub fn required(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            required: true,
            default: None,
        }
    }

    /// Creates an optional variable definition.
    #[must_use]
    pub fn optional(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            required: false,
            default: None,
        }
    }

    /// Sets a default value.
    #[must_use]
    pub fn with_default(mut self, default: JsonValue) -> Self {
        self.default = Some(default);
        self
    }
}

/// A rendered prompt ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub text: String,
    pub system: Option<String>,
}

/// Replaces `{{name}}` placeholders in one left-to-right pass.
///
/// Substituted text is never rescanned, so values may contain braces.
/// Placeholders `lookup` does not know are left as written.
fn substitute<'a>(template: &str, lookup: impl Fn(&str) -> Option<&'a JsonValue>) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let value = after
            .find("}}")
            .and_then(|end| lookup(&after[..end]).map(|value| (end, value)));
        match value {
            Some((end, JsonValue::String(s))) => {
                result.push_str(s);
                rest = &after[end + 2..];
            }
            Some((end, other)) => {
                result.push_str(&other.to_string());
                rest = &after[end + 2..];
            }
            None => {
                result.push_str("{{");
                rest = after;
            }
        }
    }

    result.push_str(rest);
    result
}

impl PromptTemplate {
    /// Creates a new prompt template.
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            version: "0.1.0".to_string(),
            content: content.into(),
            system_prompt: None,
            description: None,
            variables: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Sets the system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = Some(system.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a variable definition.
    #[must_use]
    pub fn with_variable(
        mut self,
        name: impl Into<String>,
        definition: VariableDefinition,
    ) -> Self {
        self.variables.insert(name.into(), definition);
        self
    }

    /// Renders the template with the given variables.
    ///
    /// Variables are substituted using `{{variable_name}}` syntax. Defaults
    /// fill placeholders the caller did not supply.
    #[must_use]
    pub fn render(&self, variables: &Variables) -> String {
        substitute(&self.content, |name| self.lookup(variables, name))
    }

    /// Renders the system prompt with the given variables.
    #[must_use]
    pub fn render_system_prompt(&self, variables: &Variables) -> Option<String> {
        self.system_prompt
            .as_ref()
            .map(|template| substitute(template, |name| self.lookup(variables, name)))
    }

    fn lookup<'a>(&'a self, variables: &'a Variables, name: &str) -> Option<&'a JsonValue> {
        variables.get(name).or_else(|| {
            self.variables
                .get(name)
                .and_then(|definition| definition.default.as_ref())
        })
    }

    /// Validates that all required variables are provided.
    pub fn validate_variables(&self, variables: &Variables) -> Result<(), Vec<String>> {
        let mut missing: Vec<String> = self
            .variables
            .iter()
            .filter(|(_, def)| def.required && def.default.is_none())
            .filter(|(name, _)| !variables.contains_key(*name))
            .map(|(name, _)| name.clone())
            .collect();
        missing.sort();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }

    /// Validates the variables, then renders the prompt and system prompt.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing required variable.
    pub fn render_checked(&self, variables: &Variables) -> Result<RenderedPrompt, PromptError> {
        if let Err(missing) = self.validate_variables(variables) {
            return Err(PromptError::MissingVariable {
                template: self.name.clone(),
                variable: missing.into_iter().next().unwrap_or_default(),
            });
        }
        Ok(RenderedPrompt {
            text: self.render(variables),
            system: self.render_system_prompt(variables),
        })
    }
}

/// Registry of prompt templates.
#[derive(Debug, Clone, Default)]
pub struct PromptRegistry {
    templates: HashMap<String, PromptTemplate>,
}

impl PromptRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Registers a template, replacing one with the same name.
    pub fn register(&mut self, template: PromptTemplate) {
        self.templates.insert(template.name.clone(), template);
    }

    /// Gets a template by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PromptTemplate> {
        self.templates.get(name)
    }

    /// Returns the number of registered templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Resolves and renders prompt templates for a tenant.
#[async_trait]
pub trait PromptSource: Send + Sync {
    /// Renders the template `key` for `tenant_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tenant has no such template or a required
    /// variable is missing.
    async fn render(
        &self,
        key: &str,
        variables: &Variables,
        tenant_id: &TenantId,
    ) -> Result<RenderedPrompt, PromptError>;
}

/// Per-tenant template overrides held in memory.
#[derive(Debug, Default)]
pub struct TenantPromptSource {
    registries: RwLock<HashMap<TenantId, PromptRegistry>>,
}

impl TenantPromptSource {
    /// Creates a source with no tenant templates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a template for a tenant.
    pub fn register(&self, tenant_id: TenantId, template: PromptTemplate) {
        self.registries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(tenant_id)
            .or_default()
            .register(template);
    }
}

#[async_trait]
impl PromptSource for TenantPromptSource {
    async fn render(
        &self,
        key: &str,
        variables: &Variables,
        tenant_id: &TenantId,
    ) -> Result<RenderedPrompt, PromptError> {
        let registries = self
            .registries
            .read()
            .map_err(|_| PromptError::SourceUnavailable {
                reason: "template registry lock poisoned".to_string(),
            })?;
        let template = registries
            .get(tenant_id)
            .and_then(|registry| registry.get(key))
            .ok_or_else(|| PromptError::TemplateNotFound {
                name: format!("{key} (tenant {tenant_id})"),
            })?;
        template.render_checked(variables)
    }
}
