//! Document discovery.
//!
//! Walks the content root and sorts every file into a [`Document`] (front-matter
//! present), a [`Passthrough`] asset (no front-matter), or a [`Skipped`] entry
//! (front-matter present but unusable).

use std::{
    fs,
    path::{Path, PathBuf},
};

use quire_core::{
    CoreError, Document, Format, Passthrough,
    document::output_path,
    frontmatter::parse_frontmatter,
};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Loader errors. Per-document problems are not errors; they become [`Skipped`].
#[derive(Debug, Error)]
pub enum LoadError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk error.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoadError>;

/// A source file that was excluded from the build, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    /// Source path relative to the content root.
    pub source: PathBuf,
    /// Human readable reason.
    pub reason: String,
}

/// Everything found under the content root, in file-name order.
#[derive(Debug, Default)]
pub struct LoadedContent {
    /// Documents with front-matter.
    pub documents: Vec<Document>,
    /// Files copied as-is.
    pub assets: Vec<Passthrough>,
    /// Documents excluded during loading.
    pub skipped: Vec<Skipped>,
}

/// Content loader that walks the content root.
#[derive(Debug)]
pub struct ContentLoader {
    content_dir: PathBuf,
    drafts: bool,
}

impl ContentLoader {
    /// Create a new content loader.
    #[must_use]
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: content_dir.into(),
            drafts: false,
        }
    }

    /// Include documents marked `draft: true`.
    #[must_use]
    pub fn with_drafts(mut self, drafts: bool) -> Self {
        self.drafts = drafts;
        self
    }

    /// Load all content from the content root.
    pub fn load(&self) -> Result<LoadedContent> {
        let mut content = LoadedContent::default();

        if !self.content_dir.is_dir() {
            warn!(dir = %self.content_dir.display(), "content directory does not exist");
            return Ok(content);
        }

        info!(dir = %self.content_dir.display(), "loading content");

        let walker = WalkDir::new(&self.content_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            self.load_file(entry.path(), &mut content)?;
        }

        info!(
            documents = content.documents.len(),
            assets = content.assets.len(),
            skipped = content.skipped.len(),
            "content loading complete"
        );

        Ok(content)
    }

    /// Classify a single file.
    fn load_file(&self, path: &Path, content: &mut LoadedContent) -> Result<()> {
        let relative = path
            .strip_prefix(&self.content_dir)
            .unwrap_or(path)
            .to_path_buf();

        let format = path
            .extension()
            .and_then(|ext| Format::from_extension(&ext.to_string_lossy()));

        let Some(format) = format else {
            content.assets.push(passthrough(path, relative));
            return Ok(());
        };

        // Non UTF-8 files cannot carry front-matter.
        let Ok(text) = String::from_utf8(fs::read(path)?) else {
            content.assets.push(passthrough(path, relative));
            return Ok(());
        };

        match load_document(&relative, &text, format) {
            Ok(Some(doc)) => {
                if doc.front.draft() && !self.drafts {
                    debug!(path = %relative.display(), "skipping draft");
                } else {
                    debug!(path = %relative.display(), output = %doc.output.display(), "loaded document");
                    content.documents.push(doc);
                }
            }
            Ok(None) => content.assets.push(passthrough(path, relative)),
            Err(e) => {
                warn!(path = %relative.display(), error = %e, "skipping document");
                content.skipped.push(Skipped {
                    source: relative,
                    reason: e.to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Parse a document from its text; `Ok(None)` means it has no front-matter.
pub fn load_document(
    relative: &Path,
    text: &str,
    format: Format,
) -> std::result::Result<Option<Document>, CoreError> {
    let Some((front, body)) = parse_frontmatter(text, relative)? else {
        return Ok(None);
    };

    if body.trim().is_empty() {
        return Err(CoreError::malformed(relative, "document body is empty"));
    }

    let output = output_path(relative, front.permalink())
        .ok_or_else(|| CoreError::malformed(relative, "output path escapes the output directory"))?;

    Ok(Some(Document {
        source: relative.to_path_buf(),
        front,
        body,
        format,
        output,
        html: None,
    }))
}

fn passthrough(path: &Path, relative: PathBuf) -> Passthrough {
    Passthrough {
        source: path.to_path_buf(),
        output: relative,
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}
