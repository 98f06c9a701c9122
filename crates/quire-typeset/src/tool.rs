//! External executables.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::Command,
};

use tracing::debug;

use crate::{Result, TypesetError};

/// A resolved external executable.
#[derive(Debug, Clone)]
pub struct Tool {
    name: String,
    path: PathBuf,
}

/// Captured result of running a [`Tool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code; `None` when terminated by a signal.
    pub code: Option<i32>,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
}

impl ToolOutput {
    /// Whether the process exited with status zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stdout followed by stderr.
    #[must_use]
    pub fn text(&self) -> String {
        let mut text = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&self.stderr);
        }
        text
    }
}

impl Tool {
    /// Find `name` on `PATH` (or check it directly if it is a path).
    pub fn resolve(name: &str) -> Result<Self> {
        let path = which::which(name).map_err(|_| TypesetError::ExternalToolMissing {
            tool: name.to_string(),
        })?;

        debug!(tool = name, path = %path.display(), "resolved executable");
        Ok(Self {
            name: name.to_string(),
            path,
        })
    }

    /// Name as configured.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run to completion in `cwd`, capturing both output streams.
    pub fn run<S: AsRef<OsStr>>(&self, args: &[S], cwd: &Path) -> Result<ToolOutput> {
        debug!(
            tool = %self.name,
            args = ?args.iter().map(|a| a.as_ref().to_string_lossy()).collect::<Vec<_>>(),
            cwd = %cwd.display(),
            "running"
        );

        let output = Command::new(&self.path).args(args).current_dir(cwd).output()?;

        Ok(ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
