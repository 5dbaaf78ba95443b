//! Governance evaluation for ruleflow.
//!
//! The engine never decides on its own whether an automated mutation is
//! allowed. It asks a [`GovernanceEvaluator`] and acts on the boolean
//! verdict. [`PolicyGovernance`] is a tenant-scoped rule table suitable for
//! single-process deployments and tests.

mod error;
mod evaluator;
mod types;

pub use error::GovernanceError;
pub use evaluator::{GovernanceEvaluator, PolicyGovernance};
pub use types::{Effect, GovernanceRequest, PolicyRule, Verdict, WORKFLOW_ENGINE_ACTOR};
