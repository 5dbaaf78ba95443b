use clap::{Parser, Subcommand};
use ruleflow_workflow::EntityType;
use std::path::PathBuf;

/// Ruleflow - tenant-scoped workflow automation
#[derive(Debug, Parser)]
#[command(name = "ruleflow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay NDJSON events from stdin against a fixture of workflows
    Run {
        /// Fixture file with workflows, definitions and governance policies (JSON)
        #[arg(long)]
        workflows: PathBuf,
    },

    /// Ask the model whether an existing definition covers a need
    Suggest {
        #[arg(long)]
        tenant: String,

        #[arg(long, value_parser = parse_entity_type)]
        entity_type: EntityType,

        #[arg(long)]
        industry: Option<String>,

        /// Fixture file whose definitions are offered for reuse
        #[arg(long)]
        definitions: Option<PathBuf>,

        /// Natural-language description of the need
        description: String,
    },

    /// Draft a new workflow definition from a description
    Propose {
        #[arg(long)]
        tenant: String,

        #[arg(long, value_parser = parse_entity_type)]
        entity_type: EntityType,

        #[arg(long)]
        industry: Option<String>,

        /// Natural-language description of the process
        description: String,
    },
}

fn parse_entity_type(value: &str) -> Result<EntityType, String> {
    value.parse()
}
