//! The typesetting pipeline: engine run, then quality check.

use std::{
    fs,
    path::{Path, PathBuf},
};

use quire_core::config::TypesetConfig;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::{
    Result, TypesetError,
    check::{Diagnostic, diagnostics_for},
    tool::Tool,
};

/// Outcome of a successful typesetting run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Expected location of the produced PDF.
    pub pdf: PathBuf,
    /// Checker warnings, in source-file order.
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildReport {
    /// Whether the checker had nothing to say.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Runs the configured engine and checker over a source tree.
#[derive(Debug, Clone)]
pub struct Typesetter {
    config: TypesetConfig,
}

impl Typesetter {
    /// Create a typesetter from configuration.
    #[must_use]
    pub fn new(config: &TypesetConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Typeset `source_dir` and check every `.tex` file under it.
    ///
    /// Checker warnings never fail the build; they are returned in the report.
    pub fn build(&self, source_dir: &Path) -> Result<BuildReport> {
        let engine = Tool::resolve(&self.config.engine)?;
        let checker = Tool::resolve(&self.config.checker)?;

        info!(source = %source_dir.display(), main = %self.config.main, "typesetting");

        let mut args = self.config.engine_args.clone();
        args.push(format!("-output-directory={}", self.config.output_dir.display()));
        args.push(self.config.main.clone());

        let output = engine.run(&args, source_dir)?;
        if !output.success() {
            return Err(TypesetError::TypesettingFailed {
                code: output.code,
                output: output.text(),
            });
        }

        let mut diagnostics = Vec::new();
        let skip = source_dir.join(&self.config.output_dir);
        for file in tex_sources(source_dir, &skip)? {
            let file = file.to_string_lossy().into_owned();
            let mut args = self.config.checker_args.clone();
            args.push(file.clone());

            let output = checker.run(&args, source_dir)?;
            let found = diagnostics_for(&file, output.success(), &output.text());
            debug!(file = %file, count = found.len(), "checked");
            diagnostics.extend(found);
        }

        for d in &diagnostics {
            warn!(file = %d.file, line = ?d.line, message = %d.message, "quality warning");
        }

        let pdf = source_dir
            .join(&self.config.output_dir)
            .join(Path::new(&self.config.main).with_extension("pdf"));

        info!(pdf = %pdf.display(), warnings = diagnostics.len(), "typesetting complete");
        Ok(BuildReport { pdf, diagnostics })
    }

    /// Run the engine's clean invocation and remove the output directory.
    pub fn clean(&self, source_dir: &Path) -> Result<()> {
        let engine = Tool::resolve(&self.config.engine)?;

        let mut args = self.config.clean_args.clone();
        args.push(format!("-output-directory={}", self.config.output_dir.display()));
        args.push(self.config.main.clone());

        let output = engine.run(&args, source_dir)?;
        if !output.success() {
            return Err(TypesetError::TypesettingFailed {
                code: output.code,
                output: output.text(),
            });
        }

        let out = source_dir.join(&self.config.output_dir);
        if out.is_dir() && out != source_dir {
            fs::remove_dir_all(&out)?;
            debug!(dir = %out.display(), "removed output directory");
        }

        info!(source = %source_dir.display(), "clean complete");
        Ok(())
    }
}

/// `.tex` files under `dir`, relative to it, sorted. The output directory
/// and hidden entries are skipped.
fn tex_sources(dir: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !(e.file_name().to_string_lossy().starts_with('.') || e.path() == output_dir)
        });

    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|e| e == "tex") {
            if let Ok(relative) = entry.path().strip_prefix(dir) {
                files.push(relative.to_path_buf());
            }
        }
    }

    Ok(files)
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::fs::PermissionsExt;

    use tempfile::TempDir;

    use super::*;

    /// Write an executable shell script and return its path.
    fn fake_tool(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn setup() -> (TempDir, PathBuf, TypesetConfig) {
        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("bin");
        let src = dir.path().join("cv");
        fs::create_dir_all(&bin).unwrap();
        fs::create_dir_all(src.join("sections")).unwrap();
        fs::write(src.join("main.tex"), "\\documentclass{article}").unwrap();
        fs::write(src.join("sections/work.tex"), "Work").unwrap();

        let mut config = TypesetConfig::default();
        config.engine = fake_tool(
            &bin,
            "engine",
            "echo \"$@\" > engine-args.txt\n\
             if [ \"$1\" = \"-C\" ]; then exit 0; fi\n\
             mkdir -p build && touch build/main.pdf",
        );
        config.checker = fake_tool(&bin, "checker", "exit 0");
        (dir, src, config)
    }

    #[test]
    fn test_build_success() {
        let (_dir, src, config) = setup();

        let report = Typesetter::new(&config).build(&src).unwrap();

        assert!(report.passed());
        assert_eq!(report.pdf, src.join("build/main.pdf"));
        assert!(report.pdf.exists());
        let args = fs::read_to_string(src.join("engine-args.txt")).unwrap();
        assert_eq!(
            args.trim(),
            "-pdf -interaction=nonstopmode -halt-on-error -output-directory=build main.tex"
        );
    }

    #[test]
    fn test_engine_failure_is_verbatim() {
        let (dir, src, mut config) = setup();
        config.engine = fake_tool(
            &dir.path().join("bin"),
            "broken",
            "echo '! Undefined control sequence.'\necho 'l.7 foo' >&2\nexit 12",
        );

        let err = Typesetter::new(&config).build(&src).unwrap_err();
        match err {
            TypesetError::TypesettingFailed { code, output } => {
                assert_eq!(code, Some(12));
                assert_eq!(output, "! Undefined control sequence.\nl.7 foo\n");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_checker_diagnostics_do_not_fail() {
        let (dir, src, mut config) = setup();
        config.checker = fake_tool(
            &dir.path().join("bin"),
            "lint",
            "for f; do last=$f; done\necho \"$last:3:Command terminated with space.\"\nexit 2",
        );

        let report = Typesetter::new(&config).build(&src).unwrap();

        assert!(!report.passed());
        let files: Vec<_> = report.diagnostics.iter().map(|d| d.file.as_str()).collect();
        assert_eq!(files, vec!["main.tex", "sections/work.tex"]);
        assert!(report.diagnostics.iter().all(|d| d.line == Some(3)));
    }

    #[test]
    fn test_checker_failure_without_lines() {
        let (dir, src, mut config) = setup();
        config.checker = fake_tool(&dir.path().join("bin"), "crash", "echo 'segfault' >&2\nexit 1");

        let report = Typesetter::new(&config).build(&src).unwrap();

        assert_eq!(report.diagnostics.len(), 2);
        assert_eq!(report.diagnostics[0].message, "segfault");
        assert_eq!(report.diagnostics[0].line, None);
    }

    #[test]
    fn test_missing_engine() {
        let (_dir, src, mut config) = setup();
        config.engine = "quire-missing-engine".to_string();

        let err = Typesetter::new(&config).build(&src).unwrap_err();
        assert!(matches!(err, TypesetError::ExternalToolMissing { tool } if tool == "quire-missing-engine"));
    }

    #[test]
    fn test_clean() {
        let (_dir, src, config) = setup();
        let typesetter = Typesetter::new(&config);
        typesetter.build(&src).unwrap();
        assert!(src.join("build").exists());

        typesetter.clean(&src).unwrap();
        assert!(!src.join("build").exists());
        let args = fs::read_to_string(src.join("engine-args.txt")).unwrap();
        assert!(args.starts_with("-C "));
    }
}
