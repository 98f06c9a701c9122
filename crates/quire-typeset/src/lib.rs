//! Quire Typeset Library
//!
//! Builds a PDF from LaTeX sources with an external engine and runs a quality
//! checker over the sources.
//!
//! # Modules
//!
//! - [`tool`] - External executable resolution and invocation
//! - [`check`] - Checker output parsing
//! - [`build`] - The typesetting pipeline

pub mod build;
pub mod check;
pub mod tool;

use thiserror::Error;

pub use build::{BuildReport, Typesetter};
pub use check::Diagnostic;
pub use tool::{Tool, ToolOutput};

/// Document build errors.
#[derive(Debug, Error)]
pub enum TypesetError {
    /// A required executable is not installed.
    #[error("`{tool}` not found. Please install it first.")]
    ExternalToolMissing {
        /// Executable name as configured.
        tool: String,
    },

    /// The engine exited unsuccessfully.
    #[error("typesetting failed{}:\n{output}", .code.map(|c| format!(" with exit code {c}")).unwrap_or_default())]
    TypesettingFailed {
        /// Engine exit code; `None` when killed by a signal.
        code: Option<i32>,
        /// Engine stdout followed by stderr.
        output: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk error.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Result type for document build operations.
pub type Result<T> = std::result::Result<T, TypesetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TypesetError::ExternalToolMissing {
            tool: "latexmk".to_string(),
        };
        assert_eq!(err.to_string(), "`latexmk` not found. Please install it first.");

        let err = TypesetError::TypesettingFailed {
            code: Some(12),
            output: "! Undefined control sequence.".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "typesetting failed with exit code 12:\n! Undefined control sequence."
        );
    }
}
