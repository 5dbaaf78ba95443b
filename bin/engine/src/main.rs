mod cli;
mod config;
mod error;
mod propose;
mod run;

use clap::Parser;
use crate::cli::{Cli, Command};
use crate::config::AppConfig;
use crate::error::CliError;
use rootcause::prelude::Report;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // stdout carries command output; logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<(), Report<CliError>> {
    let config = AppConfig::from_env().map_err(|e| CliError::Config {
        details: e.to_string(),
    })?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Command::Run { workflows } => run::run(&workflows, &config).await,
        Command::Suggest {
            tenant,
            entity_type,
            industry,
            definitions,
            description,
        } => {
            let suggestion = propose::suggest(
                &config,
                &tenant,
                entity_type,
                industry,
                definitions.as_deref(),
                &description,
            )
            .await?;
            print_json(&suggestion)
        }
        Command::Propose {
            tenant,
            entity_type,
            industry,
            description,
        } => {
            let definition =
                propose::propose(&config, &tenant, entity_type, industry, &description).await?;
            print_json(&definition)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Report<CliError>> {
    let json = serde_json::to_string_pretty(value).map_err(|e| CliError::InvalidInput {
        details: e.to_string(),
    })?;
    println!("{json}");
    Ok(())
}
