//! Command implementations for the `bastion` CLI.

pub mod check;
pub mod normalize;
pub mod simulate;
pub mod sql;

use std::path::Path;

use anyhow::{Context, Result};
use bastion_core::BastionConfig;
use bastion_engine::PolicyEngine;

/// Load a configuration file and build an engine from it.
pub fn load_engine(config_path: &Path) -> Result<(BastionConfig, PolicyEngine)> {
    let config = BastionConfig::from_file(config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    let engine = PolicyEngine::from_config(&config)
        .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;
    tracing::debug!(path = %config_path.display(), "Loaded configuration");
    Ok((config, engine))
}
