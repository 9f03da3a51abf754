pub mod classify;
pub mod run;
pub mod tree;

use arborist_core::config::RunConfig;
use arborist_store::{load_seed_file, MemoryStore};
use clap::Args;
use std::path::PathBuf;

/// Seed file and rule configuration shared by every command
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Path to the seed YAML holding the document tree
    #[arg(long)]
    pub seed: PathBuf,

    /// Path to the TOML run configuration (rules, root collection, limits)
    #[arg(long)]
    pub config: PathBuf,
}

impl SourceArgs {
    /// Load the seed into a fresh store and read the configuration
    pub fn load(&self) -> Result<(MemoryStore, RunConfig), Box<dyn std::error::Error>> {
        let config = RunConfig::load(&self.config)?;
        let store = load_seed_file(&self.seed)?;
        tracing::debug!(
            seed = %self.seed.display(),
            documents = store.len(),
            root_collection = %config.root_collection,
            "loaded seed"
        );
        Ok((store, config))
    }
}
