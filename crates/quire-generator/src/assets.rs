//! Static files copied verbatim into the output tree.

use std::{
    fs,
    path::{Path, PathBuf},
};

use quire_core::Passthrough;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Asset processing errors.
#[derive(Debug, Error)]
pub enum AssetError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk error.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Invalid asset path.
    #[error("invalid asset path: {0}")]
    InvalidPath(PathBuf),
}

/// Result type for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;

/// Collect every file under the static directory, in file-name order.
///
/// Hidden files and directories are ignored. A missing directory yields no
/// assets.
pub fn collect_static(dir: &Path) -> Result<Vec<Passthrough>> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "static directory does not exist, skipping");
        return Ok(Vec::new());
    }

    let mut assets = Vec::new();
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.')
        });

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(|_| AssetError::InvalidPath(entry.path().to_path_buf()))?;

        assets.push(Passthrough {
            source: entry.path().to_path_buf(),
            output: relative.to_path_buf(),
        });
    }

    info!(dir = %dir.display(), count = assets.len(), "static files collected");
    Ok(assets)
}

/// Copy a passthrough file to its place under `output_dir`.
pub fn copy_asset(asset: &Passthrough, output_dir: &Path) -> Result<()> {
    let dest = output_dir.join(&asset.output);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::copy(&asset.source, &dest)?;
    debug!(src = %asset.source.display(), dest = %dest.display(), "copied asset");
    Ok(())
}
