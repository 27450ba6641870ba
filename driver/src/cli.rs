//! # CLI Interface
//!
//! Defines the command-line argument structure for `gamevault` using
//! `clap` derive. Supports three subcommands: `deploy`, `run`, and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// GameVault deployment driver.
///
/// Deploys a vault from a JSON configuration, enables its withdraw admins,
/// hands ownership to the configured owner, and optionally replays a
/// scenario script against the result.
#[derive(Parser, Debug)]
#[command(
    name = "gamevault",
    about = "GameVault deployment driver",
    version,
    propagate_version = true
)]
pub struct GameVaultCli {
    /// Log output format: `pretty` or `json`. Logs go to stderr.
    #[arg(long, global = true, env = "GAMEVAULT_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy a vault and print the deployment summary as JSON.
    Deploy(DeployArgs),
    /// Deploy a vault, then replay a scenario script against it.
    Run(RunArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `deploy` subcommand.
#[derive(Parser, Debug)]
pub struct DeployArgs {
    /// Path to the deploy configuration (JSON).
    #[arg(long, short = 'c', env = "GAMEVAULT_CONFIG")]
    pub config: PathBuf,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the deploy configuration (JSON).
    #[arg(long, short = 'c', env = "GAMEVAULT_CONFIG")]
    pub config: PathBuf,

    /// Path to the scenario script (JSON).
    #[arg(long, short = 's')]
    pub script: PathBuf,

    /// Print Prometheus metrics (text exposition format) after the report.
    #[arg(long)]
    pub metrics: bool,
}
