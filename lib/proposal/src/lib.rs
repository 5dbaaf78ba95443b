//! LLM-assisted workflow proposals for ruleflow.
//!
//! Given a natural-language description, the [`ProposalOrchestrator`] either
//! recommends one of the tenant's existing definitions or drafts a new
//! state-machine definition, checked by a [`DefinitionValidator`] before it
//! is returned.
//!
//! [`DefinitionValidator`]: ruleflow_workflow::DefinitionValidator

pub mod assemble;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod schema;
pub mod templates;

pub use assemble::assemble;
pub use config::ProposalConfig;
pub use error::{ProposalError, ProposalStage};
pub use orchestrator::{
    DefinitionRequest, PROPOSAL_SOURCE, ProposalOrchestrator, SuggestionRequest,
};
pub use schema::{Proposal, Suggestion, SuggestionAction};
pub use templates::{WORKFLOW_GENERATOR, WORKFLOW_ROUTER, master_template};
