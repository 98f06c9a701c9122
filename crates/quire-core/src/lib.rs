//! Quire Core Library
//!
//! Document model, front-matter parsing, configuration and error types shared by
//! the Quire site assembler and document build tool.

pub mod config;
pub mod document;
pub mod error;
pub mod frontmatter;

pub use config::Config;
pub use document::{Document, Format, Passthrough};
pub use error::{CoreError, Result};
pub use frontmatter::{FrontMatter, FrontValue};
