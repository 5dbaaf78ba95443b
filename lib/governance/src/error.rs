//! Governance error types.

use std::fmt;

/// Governance errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    /// The decision point could not be reached.
    Unavailable {
        /// Error details.
        details: String,
    },
    /// The request was malformed.
    InvalidInput {
        /// Error details.
        details: String,
    },
}

impl fmt::Display for GovernanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { details } => {
                write!(f, "governance engine unavailable: {}", details)
            }
            Self::InvalidInput { details } => {
                write!(f, "invalid governance request: {}", details)
            }
        }
    }
}

impl std::error::Error for GovernanceError {}
