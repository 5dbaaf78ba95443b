//! AI primitives for ruleflow.
//!
//! - **Backend**: single-shot text generation behind [`LlmBackend`], with an
//!   Ollama implementation
//! - **Prompts**: `{{variable}}` templates and tenant-scoped [`PromptSource`]s
//! - **Parsing**: lenient JSON extraction from model output

pub mod backend;
pub mod error;
pub mod ollama;
pub mod parse;
pub mod prompt;

pub use backend::{LlmBackend, LlmConfig, LlmProvider, LlmRequest, LlmResponse, TokenUsage};
pub use error::{LlmError, PromptError};
pub use ollama::OllamaBackend;
pub use parse::extract_json_object;
pub use prompt::{
    PromptRegistry, PromptSource, PromptTemplate, RenderedPrompt, TenantPromptSource,
    VariableDefinition, Variables,
};
