//! Clean command - removes the generated site

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use quire_generator::Builder;

/// Run the clean command.
pub fn run(config_path: &Path) -> Result<()> {
    let config = super::load_config(config_path)?;
    let output = config.build.output_dir.clone();

    let removed = Builder::new(config)
        .clean()
        .wrap_err("Failed to clean output directory")?;

    if removed {
        println!("  ✓ Removed {}", output.display());
    } else {
        println!("  Nothing to clean at {}", output.display());
    }
    Ok(())
}
