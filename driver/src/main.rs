// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # GameVault Driver
//!
//! Entry point for the `gamevault` binary. Parses CLI arguments, initializes
//! logging, deploys a vault from a JSON configuration, and optionally
//! replays a scenario script against it.
//!
//! The binary supports three subcommands:
//!
//! - `deploy`: deploy and print the deployment summary
//! - `run`: deploy, replay a scenario, print the run report
//! - `version`: print build version information
//!
//! Logs go to stderr; stdout carries only JSON (and metrics with `--metrics`).

mod accounts;
mod cli;
mod config;
mod deploy;
mod logging;
mod metrics;
mod scenario;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Commands, GameVaultCli};
use config::DeployConfig;
use deploy::Deployment;
use logging::LogFormat;
use metrics::DriverMetrics;
use scenario::{Runner, Script};

fn main() -> Result<()> {
    let cli = GameVaultCli::parse();

    match cli.command {
        Commands::Deploy(args) => {
            logging::init_logging(
                logging::DEFAULT_FILTER,
                LogFormat::from_str_lossy(&cli.log_format),
            );
            deploy_vault(args)
        }
        Commands::Run(args) => {
            logging::init_logging(
                logging::DEFAULT_FILTER,
                LogFormat::from_str_lossy(&cli.log_format),
            );
            run_scenario(args)
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Deploys the configured vault and prints its summary.
fn deploy_vault(args: cli::DeployArgs) -> Result<()> {
    let config = DeployConfig::load(&args.config)?;
    tracing::info!(config = %args.config.display(), network = %config.network, "deploying GameVault");

    let deployment = Deployment::deploy(&config)?;
    let summary = serde_json::to_string_pretty(&deployment.summary())
        .context("failed to encode deployment summary")?;
    println!("{summary}");
    Ok(())
}

/// Deploys the configured vault, replays the script, and prints the report.
fn run_scenario(args: cli::RunArgs) -> Result<()> {
    let config = DeployConfig::load(&args.config)?;
    let script = Script::load(&args.script)?;
    tracing::info!(
        config = %args.config.display(),
        script = %args.script.display(),
        steps = script.steps.len(),
        "running scenario"
    );

    let mut deployment = Deployment::deploy(&config)?;
    let metrics = DriverMetrics::new().context("failed to register metrics")?;
    let outcome = Runner::new(&mut deployment, &metrics).run(&script);

    if args.metrics {
        let text = metrics.encode().context("failed to encode metrics")?;
        print!("{text}");
    }

    let report = outcome?;
    let rendered =
        serde_json::to_string_pretty(&report).context("failed to encode run report")?;
    println!("{rendered}");
    tracing::info!(
        steps = report.steps_executed,
        calls = report.calls.len(),
        events = report.events.len(),
        "scenario completed"
    );
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("gamevault {}", env!("CARGO_PKG_VERSION"));
    println!("protocol  {}", gamevault_protocol::config::PROTOCOL_VERSION);
}
