pub mod add_input;
pub mod config;
pub mod import;
pub mod init;
pub mod populate;
mod progress;
pub mod show;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;
use vistune_core::consts::MASTER_ENV_VAR;
use vistune_core::pipeline::config::PipelineConfig;
use vistune_core::store::RecordStore;

/// Options shared by every command that touches the store.
#[derive(Args)]
pub struct StoreArgs {
    /// Pipeline config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Record store path, overriding the config
    #[arg(long)]
    pub store: Option<PathBuf>,
}

impl StoreArgs {
    /// The config file (or defaults), with the store override and the
    /// `MASTER` environment variable applied.
    pub fn load_config(&self) -> Result<PipelineConfig> {
        let mut config = match self.config {
            Some(ref path) => read_config(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(ref store) = self.store {
            config.store.path = store.clone();
        }
        if let Ok(master) = std::env::var(MASTER_ENV_VAR) {
            config.compute.master = master;
        }
        debug!(
            store = %config.store.path.display(),
            master = %config.compute.master,
            "Resolved pipeline config"
        );
        Ok(config)
    }

    pub fn open_store(&self, config: &PipelineConfig) -> Result<RecordStore> {
        RecordStore::open(&config.store.path)
            .with_context(|| format!("Failed to open store {}", config.store.path.display()))
    }
}

fn read_config(path: &Path) -> Result<PipelineConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    PipelineConfig::from_toml(&contents).context("Invalid pipeline config")
}
