//! Build command - generates the static site

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr, bail};
use quire_core::Config;
use quire_generator::{BuildSummary, Builder};

/// Command-line overrides for a build.
#[derive(Debug, Clone, Default)]
pub struct BuildArgs {
    /// Fail when anything was skipped or warned about.
    pub strict: bool,
    /// Include draft documents.
    pub drafts: bool,
    /// Output directory override.
    pub output: Option<PathBuf>,
}

impl BuildArgs {
    /// Apply the overrides to a loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(output) = &self.output {
            config.build.output_dir = output.clone();
        }
        config.build.drafts |= self.drafts;
        config.build.strict |= self.strict;
    }
}

/// Run the build command.
///
/// Builds the static site from content files to the output directory.
pub fn run(config_path: &Path, args: &BuildArgs) -> Result<BuildSummary> {
    tracing::info!(?config_path, ?args, "Starting build");

    let mut config = super::load_config(config_path)?;
    args.apply(&mut config);
    let strict = config.build.strict;
    let output = config.build.output_dir.clone();

    let summary = Builder::new(config).build().wrap_err("Build failed")?;
    print_summary(&summary, &output);

    if strict && summary.has_warnings() {
        bail!(
            "strict mode: {} skipped document(s), {} warning(s)",
            summary.skipped.len(),
            summary.warnings.len()
        );
    }

    Ok(summary)
}

/// Print skipped documents and warnings, then a final line with counts.
pub fn print_summary(summary: &BuildSummary, output: &Path) {
    if !summary.skipped.is_empty() {
        println!();
        println!("  Skipped:");
        for skipped in &summary.skipped {
            println!("  ✗ {}: {}", skipped.source.display(), skipped.reason);
        }
    }

    if !summary.warnings.is_empty() {
        println!();
        println!("  Warnings:");
        for warning in &summary.warnings {
            println!("  ⚠ {warning}");
        }
    }

    println!();
    println!(
        "  ✓ Built {} pages, {} generated, {} assets into {} in {}ms ({} skipped, {} warnings)",
        summary.pages,
        summary.generated,
        summary.assets,
        output.display(),
        summary.duration_ms,
        summary.skipped.len(),
        summary.warnings.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::new("T", "https://example.com");
        let args = BuildArgs {
            strict: true,
            drafts: false,
            output: Some(PathBuf::from("dist")),
        };

        args.apply(&mut config);

        assert_eq!(config.build.output_dir, PathBuf::from("dist"));
        assert!(config.build.strict);
        assert!(!config.build.drafts);
    }

    #[test]
    fn test_apply_keeps_config_flags() {
        let mut config = Config::new("T", "https://example.com");
        config.build.drafts = true;

        BuildArgs::default().apply(&mut config);

        assert!(config.build.drafts);
        assert_eq!(config.build.output_dir, PathBuf::from("public"));
    }
}
