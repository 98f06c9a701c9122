//! Command implementations.

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use quire_core::Config;

pub mod build;
pub mod clean;
pub mod cv;
pub mod serve;

/// Load the configuration file with environment overrides applied.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load(path)
        .wrap_err_with(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}
