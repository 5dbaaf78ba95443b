//! LLM backend abstraction.
//!
//! Provides a unified interface for LLM providers. The proposal path only
//! needs single-shot text generation, so that is all the contract covers.

use crate::error::LlmError;
use async_trait::async_trait;
use ruleflow_core::{CorrelationId, TenantId};
use serde::{Deserialize, Serialize};

/// Available LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    /// Local Ollama instance.
    Ollama,
}

impl LlmProvider {
    /// Returns the provider name used in logs and errors.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.1".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

/// Connection settings for an LLM backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model used when a request does not name one.
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// A request to an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// The prompt to send.
    pub prompt: String,
    /// System prompt, if any.
    pub system: Option<String>,
    /// Temperature for sampling (0.0 - 1.0).
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Model override; the backend default is used when absent.
    pub model: Option<String>,
    /// Tenant on whose behalf the call is made, for logging and quotas.
    pub tenant_id: Option<TenantId>,
    pub correlation_id: Option<CorrelationId>,
}

impl LlmRequest {
    /// Creates a new simple request with just a prompt.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            temperature: None,
            max_tokens: None,
            model: None,
            tenant_id: None,
            correlation_id: None,
        }
    }

    /// Adds a system prompt.
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Sets the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the max tokens.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Overrides the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Scopes the request to a tenant and correlation id.
    #[must_use]
    pub fn for_tenant(mut self, tenant_id: TenantId, correlation_id: CorrelationId) -> Self {
        self.tenant_id = Some(tenant_id);
        self.correlation_id = Some(correlation_id);
        self
    }
}

/// A response from an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The generated content.
    pub content: String,
    /// Token usage statistics.
    pub usage: TokenUsage,
    /// Model that generated the response.
    pub model: String,
}

/// Token usage statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of input tokens.
    pub input_tokens: u32,
    /// Number of output tokens.
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Returns the total number of tokens.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Trait for LLM backends.
///
/// This trait defines the interface that all LLM providers must implement.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generates a response for the given request.
    ///
    /// # Errors
    ///
    /// Returns an error if the LLM call fails.
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Returns the provider type.
    fn provider(&self) -> LlmProvider;

    /// Returns the default model name.
    fn model(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_request_builder() {
        let request = LlmRequest::new("Draft a workflow")
            .with_system("Answer with JSON only.")
            .with_temperature(0.4)
            .with_max_tokens(2048)
            .for_tenant(TenantId::new("acme"), CorrelationId::new("c-1"));

        assert_eq!(request.prompt, "Draft a workflow");
        assert_eq!(request.system.as_deref(), Some("Answer with JSON only."));
        assert_eq!(request.temperature, Some(0.4));
        assert_eq!(request.max_tokens, Some(2048));
        assert_eq!(request.tenant_id, Some(TenantId::new("acme")));
        assert!(request.model.is_none());
    }

    #[test]
    fn token_usage_total() {
        let usage = TokenUsage {
            input_tokens: 100,
            output_tokens: 50,
        };
        assert_eq!(usage.total(), 150);
    }

    #[test]
    fn llm_config_defaults() {
        let config: LlmConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.model, "llama3.1");
        assert_eq!(config.timeout_secs, 120);
    }
}
