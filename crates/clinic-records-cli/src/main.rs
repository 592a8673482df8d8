//! Clinic Records - terminal front end for the patient register.

mod cli;
mod commands;
mod config;
mod logging;

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use crate::cli::Cli;
use crate::config::load_config;
use crate::logging::init_logging;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Command failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;

    let log_level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    init_logging(log_level)?;

    let data_path = cli.data.unwrap_or(config.store.data_path);
    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        data = %data_path.display(),
        "Clinic Records starting"
    );

    let mut stdout = io::stdout().lock();
    commands::execute(cli.command, &data_path, &mut stdout)
}
