//! Errors raised while reading site settings and document headers.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Settings were readable but rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("configuration file not found: {}", .0.display())]
    MissingConfig(PathBuf),

    /// A front-matter block exists but is not a flat key/value mapping.
    #[error("malformed front-matter in {}: {message}", .path.display())]
    MalformedFrontMatter { path: PathBuf, message: String },

    /// Layered settings (file plus environment) failed to merge or deserialize.
    #[error("failed to assemble settings: {0}")]
    Settings(#[from] config::ConfigError),
}

impl CoreError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedFrontMatter {
            path: path.into(),
            message: message.into(),
        }
    }
}
