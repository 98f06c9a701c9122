//! Build orchestration.
//!
//! A build loads every document, renders and composes them in parallel, plans
//! the complete output tree, and only then replaces the output directory. Any
//! failure before the write phase leaves the previous output untouched.

use std::{
    collections::HashMap,
    fs,
    path::{Component, Path, PathBuf},
    time::Instant,
};

use quire_core::{Config, Document, Passthrough};
use quire_parser::RendererRegistry;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    assets::{AssetError, collect_static, copy_asset},
    collections::SiteContext,
    compose::{ComposedPage, Composer},
    feed::{FEED_PATH, FeedError, FeedGenerator},
    loader::{ContentLoader, LoadError, Skipped},
    template::{LayoutRegistry, TemplateError},
};

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Content loading error.
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// Layout loading error.
    #[error("layout error: {0}")]
    Template(#[from] TemplateError),

    /// Asset error.
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),

    /// Feed generation error.
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    /// Two sources map to the same output file.
    #[error("output collision at {}: {first} and {second}", .path.display())]
    OutputCollision {
        /// Output path relative to the output directory.
        path: PathBuf,
        /// First claimant.
        first: String,
        /// Second claimant.
        second: String,
    },

    /// Documents were found but none of them could be rendered.
    #[error("none of the {count} documents could be rendered")]
    NothingRendered {
        /// Number of documents found.
        count: usize,
    },

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Outcome of a successful build.
#[derive(Debug, Clone, Default)]
pub struct BuildSummary {
    /// Number of document pages written.
    pub pages: usize,

    /// Number of generated pages and files (indexes, tag pages, feed).
    pub generated: usize,

    /// Number of files copied verbatim.
    pub assets: usize,

    /// Documents and generated pages left out of the build.
    pub skipped: Vec<Skipped>,

    /// Non-fatal template warnings.
    pub warnings: Vec<String>,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

impl BuildSummary {
    /// Whether anything was skipped or warned about.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.skipped.is_empty() || !self.warnings.is_empty()
    }
}

/// What a planned output file is made from.
#[derive(Debug)]
enum Contents {
    Html(String),
    Copy(PathBuf),
}

#[derive(Debug)]
struct PlannedFile {
    output: PathBuf,
    origin: String,
    contents: Contents,
}

/// Site builder that orchestrates the build process.
#[derive(Debug)]
pub struct Builder {
    config: Config,
}

impl Builder {
    /// Create a new builder. Directories are taken from `config.build`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// The configuration this builder runs with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute the full build process.
    pub fn build(&self) -> Result<BuildSummary> {
        let start = Instant::now();
        let build = &self.config.build;
        self.check_output_dir()?;

        info!(
            content = %build.content_dir.display(),
            output = %build.output_dir.display(),
            "starting build"
        );

        let layouts = LayoutRegistry::load(&build.layouts_dir)?;
        let loaded = ContentLoader::new(&build.content_dir)
            .with_drafts(build.drafts)
            .load()?;
        // Documents the loader rejected still count as found.
        let found = loaded.documents.len() + loaded.skipped.len();
        let mut summary = BuildSummary {
            skipped: loaded.skipped,
            ..BuildSummary::default()
        };

        let documents = self.render_documents(loaded.documents, &mut summary.skipped);

        let site = SiteContext::new(&self.config, &documents);
        let composer = Composer::new(&layouts, &site);

        let composed: Vec<_> = documents
            .par_iter()
            .map(|doc| (doc.source.clone(), composer.compose_document(doc)))
            .collect();

        let mut plan = Vec::new();
        for (source, result) in composed {
            match result {
                Ok(page) => {
                    summary.pages += 1;
                    plan.push(self.page_file(page, source.display().to_string(), &mut summary));
                }
                Err(e) => skip(&mut summary.skipped, source, e.to_string()),
            }
        }

        if found > 0 && summary.pages == 0 {
            return Err(BuildError::NothingRendered { count: found });
        }

        for (output, result) in composer.index_pages().into_iter().chain(composer.tag_pages()) {
            match result {
                Ok(page) => {
                    summary.generated += 1;
                    let origin = format!("generated page {}", output.display());
                    plan.push(self.page_file(page, origin, &mut summary));
                }
                Err(e) => skip(&mut summary.skipped, output, e.to_string()),
            }
        }

        if self.config.feed.enabled {
            summary.generated += 1;
            plan.push(PlannedFile {
                output: PathBuf::from(FEED_PATH),
                origin: "feed".to_string(),
                contents: Contents::Html(FeedGenerator::new(&site).generate()?),
            });
        }

        let statics = collect_static(&build.static_dir)?;
        for asset in loaded.assets.into_iter().chain(statics) {
            summary.assets += 1;
            plan.push(asset_file(asset));
        }

        check_collisions(&plan)?;

        self.prepare_output()?;
        self.write_plan(&plan)?;

        summary.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            pages = summary.pages,
            generated = summary.generated,
            assets = summary.assets,
            skipped = summary.skipped.len(),
            warnings = summary.warnings.len(),
            duration_ms = summary.duration_ms,
            "build complete"
        );

        Ok(summary)
    }

    /// Remove the output directory. Returns whether anything was removed.
    pub fn clean(&self) -> Result<bool> {
        self.check_output_dir()?;
        let dir = &self.config.build.output_dir;
        if !dir.exists() {
            return Ok(false);
        }

        debug!(dir = %dir.display(), "removing output directory");
        fs::remove_dir_all(dir)?;
        Ok(true)
    }

    fn renderers(&self) -> RendererRegistry {
        if self.config.build.highlight {
            RendererRegistry::with_highlighting(&self.config.build.syntax_theme)
        } else {
            RendererRegistry::new()
        }
    }

    fn render_documents(&self, documents: Vec<Document>, skipped: &mut Vec<Skipped>) -> Vec<Document> {
        let renderers = self.renderers();
        info!(count = documents.len(), "rendering documents");

        let results: Vec<_> = documents
            .into_par_iter()
            .map(|doc| match renderers.render_document(&doc) {
                Ok(html) => Ok(doc.with_html(html)),
                Err(e) => Err((doc.source, e.to_string())),
            })
            .collect();

        let mut rendered = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(doc) => rendered.push(doc),
                Err((source, reason)) => skip(skipped, source, reason),
            }
        }
        rendered
    }

    fn page_file(&self, page: ComposedPage, origin: String, summary: &mut BuildSummary) -> PlannedFile {
        summary.warnings.extend(page.warnings);
        PlannedFile {
            output: page.output,
            origin,
            contents: Contents::Html(page.html),
        }
    }

    /// Refuse output directories whose removal would destroy the project.
    fn check_output_dir(&self) -> Result<()> {
        let build = &self.config.build;
        let output = &build.output_dir;

        let is_root = output
            .components()
            .all(|c| matches!(c, Component::CurDir | Component::RootDir | Component::Prefix(_)));
        if is_root {
            return Err(BuildError::Config(format!(
                "refusing to use `{}` as the output directory",
                output.display()
            )));
        }

        for (name, dir) in [
            ("content", &build.content_dir),
            ("layouts", &build.layouts_dir),
            ("static", &build.static_dir),
        ] {
            if dir.starts_with(output) {
                return Err(BuildError::Config(format!(
                    "the {name} directory `{}` lies inside the output directory `{}`",
                    dir.display(),
                    output.display()
                )));
            }
            if output.starts_with(dir) {
                return Err(BuildError::Config(format!(
                    "the output directory `{}` lies inside the {name} directory `{}`",
                    output.display(),
                    dir.display()
                )));
            }
        }

        Ok(())
    }

    fn prepare_output(&self) -> Result<()> {
        let dir = &self.config.build.output_dir;
        if dir.exists() {
            debug!(dir = %dir.display(), "cleaning output directory");
            fs::remove_dir_all(dir)?;
        }
        fs::create_dir_all(dir)?;
        Ok(())
    }

    fn write_plan(&self, plan: &[PlannedFile]) -> Result<()> {
        let output_dir = &self.config.build.output_dir;

        plan.par_iter().try_for_each(|file| -> Result<()> {
            match &file.contents {
                Contents::Html(html) => write_file(&output_dir.join(&file.output), html)?,
                Contents::Copy(source) => copy_asset(
                    &Passthrough {
                        source: source.clone(),
                        output: file.output.clone(),
                    },
                    output_dir,
                )?,
            }
            debug!(path = %file.output.display(), "wrote output");
            Ok(())
        })
    }
}

fn asset_file(asset: Passthrough) -> PlannedFile {
    PlannedFile {
        origin: asset.source.display().to_string(),
        output: asset.output,
        contents: Contents::Copy(asset.source),
    }
}

fn skip(skipped: &mut Vec<Skipped>, source: PathBuf, reason: String) {
    warn!(path = %source.display(), reason = %reason, "skipping");
    skipped.push(Skipped { source, reason });
}

/// Every output must be unique and no output may be a directory of another.
fn check_collisions(plan: &[PlannedFile]) -> Result<()> {
    let mut claimed: HashMap<&Path, &str> = HashMap::with_capacity(plan.len());
    for file in plan {
        if let Some(first) = claimed.insert(file.output.as_path(), file.origin.as_str()) {
            return Err(BuildError::OutputCollision {
                path: file.output.clone(),
                first: first.to_string(),
                second: file.origin.clone(),
            });
        }
    }

    for file in plan {
        let conflict = file
            .output
            .ancestors()
            .skip(1)
            .find_map(|dir| claimed.get(dir).map(|first| (dir, *first)));
        if let Some((dir, first)) = conflict {
            return Err(BuildError::OutputCollision {
                path: dir.to_path_buf(),
                first: first.to_string(),
                second: file.origin.clone(),
            });
        }
    }
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}
