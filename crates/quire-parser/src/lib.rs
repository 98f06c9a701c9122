//! Quire Parser Library
//!
//! Renders document bodies to HTML fragments. Rendering is a pure function of
//! the body text and its format, so documents can be rendered in any order.

pub mod markdown;
pub mod syntax;

pub use markdown::MarkdownRenderer;
use quire_core::{Document, Format};
pub use syntax::SyntaxHighlighter;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A document asked for a markup format no renderer handles.
    #[error("unsupported markup format: {0}")]
    UnsupportedMarkup(String),
}

/// Result type for renderer operations.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Trait for body renderers.
pub trait Renderer: Send + Sync {
    /// Render a body to an HTML fragment.
    fn render(&self, body: &str) -> String;
}

impl Renderer for MarkdownRenderer {
    fn render(&self, body: &str) -> String {
        MarkdownRenderer::render(self, body)
    }
}

/// Renderer for bodies that are already HTML.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
    fn render(&self, body: &str) -> String {
        body.to_string()
    }
}

/// Registry mapping formats to renderers.
#[derive(Debug)]
pub struct RendererRegistry {
    markdown: MarkdownRenderer,
    html: HtmlRenderer,
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RendererRegistry {
    /// Create a registry without code highlighting.
    pub fn new() -> Self {
        Self {
            markdown: MarkdownRenderer::new(),
            html: HtmlRenderer,
        }
    }

    /// Create a registry whose Markdown renderer highlights code.
    pub fn with_highlighting(theme: &str) -> Self {
        Self {
            markdown: MarkdownRenderer::with_highlighting(theme),
            html: HtmlRenderer,
        }
    }

    /// Get the renderer for a format.
    pub fn renderer(&self, format: Format) -> &dyn Renderer {
        match format {
            Format::Markdown => &self.markdown,
            Format::Html => &self.html,
        }
    }

    /// Resolve a format name such as `markdown`.
    pub fn resolve(name: &str) -> Result<Format> {
        Format::from_name(name).ok_or_else(|| RenderError::UnsupportedMarkup(name.to_string()))
    }

    /// Render a body in the given format.
    pub fn render(&self, body: &str, format: Format) -> String {
        self.renderer(format).render(body)
    }

    /// Render a document, honoring a `format` front-matter override.
    pub fn render_document(&self, doc: &Document) -> Result<String> {
        let format = match doc.front.format() {
            Some(name) => Self::resolve(name)?,
            None => doc.format,
        };
        Ok(self.render(&doc.body, format))
    }
}

/// Escape HTML special characters.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
