//! Site configuration management.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Main configuration structure for Quire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Site-wide settings.
    pub site: SiteConfig,

    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// Derived collection settings.
    #[serde(default)]
    pub collections: CollectionsConfig,

    /// RSS feed settings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Document build tool settings.
    #[serde(default)]
    pub typeset: TypesetConfig,
}

/// Site-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site title.
    pub title: String,

    /// Base URL for the site (e.g., "https://example.com").
    pub base_url: String,

    /// Site description for meta tags and the feed.
    #[serde(default)]
    pub description: Option<String>,

    /// Site author name.
    #[serde(default)]
    pub author: Option<String>,

    /// Navigation entries.
    #[serde(default)]
    pub nav: Vec<NavItem>,
}

/// A navigation link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    /// Link label.
    pub name: String,
    /// Link target.
    pub url: String,
}

/// Build configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Directory holding Markdown documents and passthrough files.
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,

    /// Directory holding `<name>.html` layouts.
    #[serde(default = "default_layouts_dir")]
    pub layouts_dir: PathBuf,

    /// Directory copied verbatim to the output root.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Output directory for the generated site.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Layout used by documents without a `layout` key.
    #[serde(default = "default_layout")]
    pub default_layout: String,

    /// Whether to include drafts.
    #[serde(default)]
    pub drafts: bool,

    /// Treat skipped documents and template warnings as fatal.
    #[serde(default)]
    pub strict: bool,

    /// Syntax highlight fenced code blocks.
    #[serde(default)]
    pub highlight: bool,

    /// Syntax highlighting theme name.
    #[serde(default = "default_syntax_theme")]
    pub syntax_theme: String,
}

/// Derived collection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionsConfig {
    /// Number of posts exposed as `recent_posts`.
    #[serde(default = "default_recent_posts")]
    pub recent_posts: usize,

    /// Posts per page of the post index.
    #[serde(default = "default_paginate")]
    pub paginate: usize,

    /// Layout for the paginated post index; no index is generated when unset.
    #[serde(default)]
    pub index_layout: Option<String>,

    /// Output directory of the post index, relative to the output root.
    /// Empty puts the first index page at the site root.
    #[serde(default = "default_index_dir")]
    pub index_dir: String,

    /// Layout for per-tag pages; no tag pages are generated when unset.
    #[serde(default)]
    pub tag_layout: Option<String>,
}

/// RSS feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Whether the feed is generated.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum number of items in the feed.
    #[serde(default = "default_feed_limit")]
    pub limit: usize,
}

/// Document build tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypesetConfig {
    /// Directory holding the typeset sources.
    #[serde(default = "default_typeset_source")]
    pub source_dir: PathBuf,

    /// Main source file, relative to `source_dir`.
    #[serde(default = "default_typeset_main")]
    pub main: String,

    /// Directory receiving the PDF, relative to `source_dir`.
    #[serde(default = "default_typeset_output")]
    pub output_dir: PathBuf,

    /// Typesetting engine executable.
    #[serde(default = "default_engine")]
    pub engine: String,

    /// Arguments passed to the engine before the output directory and main file.
    #[serde(default = "default_engine_args")]
    pub engine_args: Vec<String>,

    /// Arguments for the engine's clean invocation.
    #[serde(default = "default_clean_args")]
    pub clean_args: Vec<String>,

    /// Quality checker executable.
    #[serde(default = "default_checker")]
    pub checker: String,

    /// Arguments passed to the checker before each source file.
    #[serde(default = "default_checker_args")]
    pub checker_args: Vec<String>,
}

// Default value functions
fn default_content_dir() -> PathBuf {
    PathBuf::from("content")
}

fn default_layouts_dir() -> PathBuf {
    PathBuf::from("layouts")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_layout() -> String {
    "default".to_string()
}

fn default_syntax_theme() -> String {
    "base16-ocean.dark".to_string()
}

fn default_recent_posts() -> usize {
    5
}

fn default_paginate() -> usize {
    10
}

fn default_index_dir() -> String {
    "posts".to_string()
}

fn default_true() -> bool {
    true
}

fn default_feed_limit() -> usize {
    20
}

fn default_typeset_source() -> PathBuf {
    PathBuf::from("cv")
}

fn default_typeset_main() -> String {
    "main.tex".to_string()
}

fn default_typeset_output() -> PathBuf {
    PathBuf::from("build")
}

fn default_engine() -> String {
    "latexmk".to_string()
}

fn default_engine_args() -> Vec<String> {
    ["-pdf", "-interaction=nonstopmode", "-halt-on-error"]
        .map(String::from)
        .to_vec()
}

fn default_clean_args() -> Vec<String> {
    vec!["-C".to_string()]
}

fn default_checker() -> String {
    "chktex".to_string()
}

fn default_checker_args() -> Vec<String> {
    ["-q", "-f", "%f:%l:%m\n"].map(String::from).to_vec()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            content_dir: default_content_dir(),
            layouts_dir: default_layouts_dir(),
            static_dir: default_static_dir(),
            output_dir: default_output_dir(),
            default_layout: default_layout(),
            drafts: false,
            strict: false,
            highlight: false,
            syntax_theme: default_syntax_theme(),
        }
    }
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        Self {
            recent_posts: default_recent_posts(),
            paginate: default_paginate(),
            index_layout: None,
            index_dir: default_index_dir(),
            tag_layout: None,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: default_feed_limit(),
        }
    }
}

impl Default for TypesetConfig {
    fn default() -> Self {
        Self {
            source_dir: default_typeset_source(),
            main: default_typeset_main(),
            output_dir: default_typeset_output(),
            engine: default_engine(),
            engine_args: default_engine_args(),
            clean_args: default_clean_args(),
            checker: default_checker(),
            checker_args: default_checker_args(),
        }
    }
}

impl Config {
    /// Create a configuration with default sections.
    pub fn new(title: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            site: SiteConfig {
                title: title.into(),
                base_url: base_url.into(),
                description: None,
                author: None,
                nav: Vec::new(),
            },
            build: BuildConfig::default(),
            collections: CollectionsConfig::default(),
            feed: FeedConfig::default(),
            typeset: TypesetConfig::default(),
        }
    }

    /// Load configuration from a TOML file, then apply `QUIRE__SECTION__KEY`
    /// environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::MissingConfig(path.to_path_buf()));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("QUIRE").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.site.title.is_empty() {
            return Err(CoreError::invalid("site.title cannot be empty"));
        }

        if self.site.base_url.is_empty() {
            return Err(CoreError::invalid("site.base_url cannot be empty"));
        }

        if self.collections.paginate == 0 {
            return Err(CoreError::invalid("collections.paginate must be at least 1"));
        }

        if self.site.base_url.ends_with('/') {
            tracing::warn!("site.base_url should not have a trailing slash");
        }

        Ok(())
    }

    /// Get the full URL for a path.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.site.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}
