//! Configuration resolution for the docwalk CLI
//!
//! Precedence, lowest first: built-in defaults, `--config` TOML file,
//! `DOCWALK_*` environment variables, command-line flags.

use anyhow::{Context, Result};
use clap::Args;
use docwalk_mongodb::{ConfigFile, WorkflowConfig};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args, Debug, Default, Clone)]
pub struct ConfigArgs {
    /// TOML file with a [workflow] table
    #[arg(short, long, env = "DOCWALK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// MongoDB connection string
    #[arg(long, env = "DOCWALK_ADDRESS", global = true)]
    pub address: Option<String>,

    /// Database name
    #[arg(long, env = "DOCWALK_DATABASE", global = true)]
    pub database: Option<String>,

    /// Collection name
    #[arg(long, env = "DOCWALK_COLLECTION", global = true)]
    pub collection: Option<String>,

    /// Per-operation deadline in seconds (0 disables it)
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Drop the collection before inserting
    #[arg(long, global = true)]
    pub drop: bool,
}

impl ConfigArgs {
    /// Build the effective configuration and validate it
    pub fn resolve(&self) -> Result<WorkflowConfig> {
        let mut config = match &self.config {
            Some(path) => {
                ConfigFile::load(path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))?
                    .workflow
            }
            None => WorkflowConfig::default(),
        };

        self.apply(&mut config);
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    fn apply(&self, config: &mut WorkflowConfig) {
        if let Some(address) = &self.address {
            config.address = address.clone();
        }
        if let Some(database) = &self.database {
            config.database = database.clone();
        }
        if let Some(collection) = &self.collection {
            config.collection = collection.clone();
        }
        if let Some(secs) = self.timeout {
            config.operation_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if self.drop {
            config.drop_before_run = true;
        }
    }
}
