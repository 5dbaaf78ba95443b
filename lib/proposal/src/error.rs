//! Error types for workflow proposals.

use ruleflow_ai::LlmError;
use ruleflow_workflow::ValidationError;
use std::fmt;

/// Stages of a proposal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalStage {
    RenderPrompt,
    CallModel,
    ParseOutput,
    Assemble,
    StructuralValidate,
}

impl ProposalStage {
    /// Returns the stage name used in audit records.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RenderPrompt => "RENDER_PROMPT",
            Self::CallModel => "CALL_MODEL",
            Self::ParseOutput => "PARSE_AND_VALIDATE_LLM_OUTPUT",
            Self::Assemble => "ASSEMBLE",
            Self::StructuralValidate => "STRUCTURAL_VALIDATE",
        }
    }
}

impl fmt::Display for ProposalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from suggesting or proposing a workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum ProposalError {
    /// Neither the tenant nor the master template could be rendered.
    PromptUnavailable { key: String, details: String },
    /// The model could not be called.
    ModelCall { source: LlmError },
    /// The model output could not be parsed or failed the schema.
    InvalidOutput { details: String },
    /// The assembled definition failed structural validation.
    InvalidDefinition(ValidationError),
}

impl ProposalError {
    /// Returns the stage at which the request failed.
    #[must_use]
    pub fn stage(&self) -> ProposalStage {
        match self {
            Self::PromptUnavailable { .. } => ProposalStage::RenderPrompt,
            Self::ModelCall { .. } => ProposalStage::CallModel,
            Self::InvalidOutput { .. } => ProposalStage::ParseOutput,
            Self::InvalidDefinition(_) => ProposalStage::StructuralValidate,
        }
    }
}

impl fmt::Display for ProposalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PromptUnavailable { key, details } => {
                write!(f, "prompt {key} unavailable: {details}")
            }
            Self::ModelCall { source } => write!(f, "model call failed: {source}"),
            Self::InvalidOutput { details } => write!(f, "invalid model output: {details}"),
            Self::InvalidDefinition(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ProposalError {}

impl From<LlmError> for ProposalError {
    fn from(source: LlmError) -> Self {
        match source {
            LlmError::ResponseParseFailed { reason } => Self::InvalidOutput { details: reason },
            other => Self::ModelCall { source: other },
        }
    }
}
