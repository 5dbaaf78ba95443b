//! Proposal configuration.

use serde::Deserialize;

fn default_industry() -> String {
    "GENERIC".to_string()
}

fn default_router_temperature() -> f32 {
    0.3
}

fn default_generator_temperature() -> f32 {
    0.4
}

/// Tunables of the proposal orchestrator.
#[derive(Debug, Clone, Deserialize)]
pub struct ProposalConfig {
    /// Industry used when a request does not name one.
    #[serde(default = "default_industry")]
    pub default_industry: String,
    #[serde(default = "default_router_temperature")]
    pub router_temperature: f32,
    #[serde(default = "default_generator_temperature")]
    pub generator_temperature: f32,
}

impl Default for ProposalConfig {
    fn default() -> Self {
        Self {
            default_industry: default_industry(),
            router_temperature: default_router_temperature(),
            generator_temperature: default_generator_temperature(),
        }
    }
}

impl ProposalConfig {
    /// Resolves the upper-cased industry for a request.
    #[must_use]
    pub fn industry(&self, requested: Option<&str>) -> String {
        requested
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.default_industry)
            .to_uppercase()
    }
}
