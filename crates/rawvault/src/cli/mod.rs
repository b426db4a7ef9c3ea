//! Command-line interface for the raw vault engine.
//!
//! The external scheduler's trigger contract is the `run` subcommand:
//! invoke it once, it completes or fails cleanly and is safe to re-invoke.

pub mod init;
pub mod run;
pub mod status;

use crate::config::VaultConfig;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "rawvault",
    about = "Incremental Parquet ingestion into the raw vault",
    version
)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(
        long,
        short,
        global = true,
        default_value = "rawvault.toml",
        env = "RAWVAULT_CONFIG"
    )]
    pub config: PathBuf,

    /// Verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute one ingest pass over the configured source directories
    Run(run::RunArgs),
    /// Summarize manifest, quarantine and warehouse state
    Status(status::StatusArgs),
    /// Write a default configuration file
    Init(init::InitArgs),
}

/// Route a parsed command line to its handler.
pub async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Run(args) => run::cmd_run(&cli.config, args).await,
        Command::Status(args) => status::cmd_status(&cli.config, args).await,
        Command::Init(args) => init::cmd_init(&cli.config, args),
    }
}

pub(crate) fn load_config(path: &Path) -> anyhow::Result<VaultConfig> {
    let config = VaultConfig::load(path)
        .with_context(|| format!("Failed to load config: {}", path.display()))?;
    config.validate()?;
    Ok(config)
}
