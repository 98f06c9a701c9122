//! CV command - typesets the LaTeX CV and checks its sources

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use quire_core::config::TypesetConfig;
use quire_typeset::{TypesetError, Typesetter};

/// Outcome of `cv build` as seen by the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CvStatus {
    /// PDF produced; checker may have reported warnings.
    Built,
    /// The engine failed with this exit code.
    EngineFailed(i32),
}

/// Run `cv build`.
///
/// An engine failure is reported as [`CvStatus::EngineFailed`] so the caller
/// can exit with the engine's own code.
pub fn build(config_path: &Path, source: Option<&Path>) -> Result<CvStatus> {
    let (typeset, source_dir) = resolve(config_path, source)?;
    tracing::info!(source = %source_dir.display(), "Building CV");

    match Typesetter::new(&typeset).build(&source_dir) {
        Ok(report) => {
            if !report.diagnostics.is_empty() {
                println!();
                println!("  Quality warnings:");
                for diagnostic in &report.diagnostics {
                    println!("  ⚠ {diagnostic}");
                }
            }
            println!();
            println!(
                "  ✓ Built {} ({} warnings)",
                report.pdf.display(),
                report.diagnostics.len()
            );
            Ok(CvStatus::Built)
        }
        Err(TypesetError::TypesettingFailed { code, output }) => {
            eprint!("{output}");
            if !output.is_empty() && !output.ends_with('\n') {
                eprintln!();
            }
            eprintln!("  ✗ Typesetting failed");
            Ok(CvStatus::EngineFailed(code.unwrap_or(1)))
        }
        Err(e) => Err(e).wrap_err("CV build failed"),
    }
}

/// Run `cv clean`.
pub fn clean(config_path: &Path, source: Option<&Path>) -> Result<()> {
    let (typeset, source_dir) = resolve(config_path, source)?;

    Typesetter::new(&typeset)
        .clean(&source_dir)
        .wrap_err("CV clean failed")?;

    println!("  ✓ Cleaned {}", source_dir.join(&typeset.output_dir).display());
    Ok(())
}

/// Typeset settings and source directory. The configuration file is optional
/// here; defaults apply when it does not exist.
fn resolve(config_path: &Path, source: Option<&Path>) -> Result<(TypesetConfig, PathBuf)> {
    let typeset = if config_path.exists() {
        super::load_config(config_path)?.typeset
    } else {
        tracing::debug!(?config_path, "No configuration file, using typeset defaults");
        TypesetConfig::default()
    };

    let source_dir = source.map_or_else(|| typeset.source_dir.clone(), Path::to_path_buf);
    Ok((typeset, source_dir))
}
