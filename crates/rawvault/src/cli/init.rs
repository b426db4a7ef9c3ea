//! `rawvault init` command - write a starter configuration.

use crate::config::{SourceDir, VaultConfig};
use anyhow::bail;
use clap::Args;
use std::path::Path;

/// Arguments for the `init` command
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,
}

/// Execute the init command
pub fn cmd_init(config_path: &Path, args: InitArgs) -> anyhow::Result<()> {
    if config_path.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }

    let config = VaultConfig {
        sources: vec![
            SourceDir {
                group: "sgx_parquet".to_string(),
                path: "processed_data/sgx_parquet".to_string(),
            },
            SourceDir {
                group: "parquet_recovered".to_string(),
                path: "processed_data/parquet_recovered".to_string(),
            },
        ],
        ..VaultConfig::default()
    };
    config.save(config_path)?;

    println!("Wrote {}", config_path.display());
    Ok(())
}
