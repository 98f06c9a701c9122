//! Quire Generator Library
//!
//! Site assembly engine for Quire.
//!
//! # Modules
//!
//! - [`loader`] - Content discovery and document classification
//! - [`template`] - Layouts with `{{ name }}` interpolation
//! - [`collections`] - Posts, tags and pagination derived from all documents
//! - [`compose`] - Merging rendered fragments into layouts
//! - [`feed`] - RSS feed generation
//! - [`assets`] - Static file collection and copying
//! - [`build`] - Build orchestration

pub mod assets;
pub mod build;
pub mod collections;
pub mod compose;
pub mod feed;
pub mod loader;
pub mod template;

pub use build::{BuildError, BuildSummary, Builder};
pub use collections::{PostEntry, SiteContext, TagGroup};
pub use compose::{ComposeError, ComposedPage, Composer};
pub use feed::FeedGenerator;
pub use loader::{ContentLoader, LoadedContent, Skipped};
pub use template::{Layout, LayoutRegistry, Template, TemplateContext};
