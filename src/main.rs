mod cli;
mod config;
mod domain;
mod infra;
mod usecase;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::Cli;

fn main() -> ExitCode {
    // Logs go to stderr so stdout carries only the JSON outcome.
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!(error = %format!("{err:#}"), "sheetflow failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<bool> {
    let outcome = cli::run(Cli::parse())?;
    let json = serde_json::to_string_pretty(&outcome).context("failed to encode outcome")?;
    println!("{json}");
    Ok(outcome.success)
}

#[cfg(test)]
mod tests;
