//! Application configuration.
//!
//! Composed from the library configs and loaded via the `config` crate from
//! environment variables such as `RULEFLOW__ENGINE__HANDLER_TIMEOUT_MS` or
//! `RULEFLOW__LLM__MODEL`.

use config::builder::{ConfigBuilder, DefaultState};
use ruleflow_ai::LlmConfig;
use ruleflow_proposal::ProposalConfig;
use ruleflow_workflow::EngineConfig;
use serde::Deserialize;

/// Top-level configuration of the binary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub proposal: ProposalConfig,

    /// LLM transport used by the proposal commands.
    #[serde(default)]
    pub llm: LlmConfig,
}

impl AppConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_builder(
            config::Config::builder().add_source(
                config::Environment::with_prefix("RULEFLOW")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            ),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, config::ConfigError> {
        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sources_yield_defaults() {
        let config = AppConfig::from_builder(config::Config::builder()).unwrap();
        assert_eq!(config.engine.handler_timeout_ms, 300_000);
        assert_eq!(config.proposal.default_industry, "GENERIC");
        assert_eq!(config.llm.base_url, "http://localhost:11434");
    }

    #[test]
    fn overrides_reach_nested_sections() {
        let builder = config::Config::builder()
            .set_override("engine.handler_timeout_ms", 0)
            .unwrap()
            .set_override("llm.model", "mistral")
            .unwrap();
        let config = AppConfig::from_builder(builder).unwrap();
        assert!(config.engine.handler_timeout().is_none());
        assert_eq!(config.llm.model, "mistral");
        assert!((config.engine.branch_risk_threshold - 75.0).abs() < f64::EPSILON);
    }
}
