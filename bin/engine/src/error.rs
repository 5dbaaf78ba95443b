//! Errors surfaced by the command-line runner.

use std::fmt;

/// Errors from CLI commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    /// Configuration could not be loaded.
    Config { details: String },
    /// A file or stream could not be read or written.
    Io { target: String, details: String },
    /// A fixture or argument was malformed.
    InvalidInput { details: String },
    /// The event processor rejected an event.
    Engine { details: String },
    /// The LLM transport could not be set up.
    Llm { details: String },
    /// A proposal request failed.
    Proposal { details: String },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "configuration error: {details}"),
            Self::Io { target, details } => write!(f, "I/O error on {target}: {details}"),
            Self::InvalidInput { details } => write!(f, "invalid input: {details}"),
            Self::Engine { details } => write!(f, "engine error: {details}"),
            Self::Llm { details } => write!(f, "LLM setup failed: {details}"),
            Self::Proposal { details } => write!(f, "proposal failed: {details}"),
        }
    }
}

impl std::error::Error for CliError {}
