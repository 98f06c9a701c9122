//! Layout templates with `{{ name }}` insertion points.
//!
//! Rendering is permissive: an unresolved placeholder becomes the empty string
//! and is reported back to the caller instead of failing. A trailing `?`
//! (`{{ name? }}`) marks a placeholder as optional so it is never reported.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use quire_core::{
    CoreError,
    frontmatter::{Split, parse_frontmatter, split_frontmatter},
};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Layout loading errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk error.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A layout's own front-matter is malformed.
    #[error(transparent)]
    FrontMatter(#[from] CoreError),
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Template context with variables for interpolation.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    variables: HashMap<String, String>,
}

impl TemplateContext {
    /// Create a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a variable into the context.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Create context with initial variables.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Get a variable value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }
}

/// Output of a template render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// The rendered text.
    pub html: String,
    /// Required placeholders that had no value, in order of appearance.
    pub missing: Vec<String>,
}

/// A template that supports variable interpolation.
///
/// Variables are specified as `{{ variable_name }}` in the template string.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    content: String,
}

impl Template {
    /// Create a new template with the given name and content.
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Get the template name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render the template with the given context.
    ///
    /// Substituted values are never rescanned for placeholders. An unclosed
    /// `{{` is copied through literally.
    pub fn render(&self, context: &TemplateContext) -> Rendered {
        let mut html = String::with_capacity(self.content.len());
        let mut missing = Vec::new();
        let mut rest = self.content.as_str();

        while let Some(start) = rest.find("{{") {
            let Some(len) = rest[start + 2..].find("}}") else {
                break;
            };

            html.push_str(&rest[..start]);
            let var_name = rest[start + 2..start + 2 + len].trim();

            let (var_name, optional) = match var_name.strip_suffix('?') {
                Some(stripped) => (stripped.trim_end(), true),
                None => (var_name, false),
            };

            match context.get(var_name) {
                Some(value) => html.push_str(value),
                None if optional => {}
                None => missing.push(var_name.to_string()),
            }

            rest = &rest[start + 2 + len + 2..];
        }

        html.push_str(rest);
        Rendered { html, missing }
    }
}

/// A named layout, optionally wrapped by a parent layout.
#[derive(Debug, Clone)]
pub struct Layout {
    /// The layout body.
    pub template: Template,
    /// Layout whose `content` receives this layout's output.
    pub parent: Option<String>,
}

impl Layout {
    /// Parse a layout file's text. A leading front-matter block may name a
    /// parent with `layout: <name>`.
    pub fn parse(name: &str, text: &str, path: &Path) -> Result<Self> {
        let (parent, body) = match split_frontmatter(text) {
            Split::Absent => (None, text.to_string()),
            _ => match parse_frontmatter(text, path)? {
                Some((front, body)) => (front.layout().map(str::to_string), body),
                None => (None, text.to_string()),
            },
        };

        Ok(Self {
            template: Template::new(name, body),
            parent,
        })
    }
}

/// Registry of layouts keyed by name.
#[derive(Debug, Clone, Default)]
pub struct LayoutRegistry {
    layouts: HashMap<String, Layout>,
}

impl LayoutRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.html` file under `dir`; the path without extension,
    /// relative to `dir`, is the layout name. A missing directory yields an
    /// empty registry.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut registry = Self::new();
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "layouts directory does not exist");
            return Ok(registry);
        }

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().is_none_or(|ext| ext != "html")
            {
                continue;
            }

            let name = layout_name(dir, path);
            let text = fs::read_to_string(path)?;
            registry.register(&name, Layout::parse(&name, &text, path)?);
            debug!(layout = %name, "loaded layout");
        }

        Ok(registry)
    }

    /// Register a layout.
    pub fn register(&mut self, name: impl Into<String>, layout: Layout) {
        self.layouts.insert(name.into(), layout);
    }

    /// Register a parentless layout from text.
    pub fn register_text(&mut self, name: impl Into<String>, text: impl Into<String>) {
        let name = name.into();
        let template = Template::new(name.clone(), text);
        self.register(
            name,
            Layout {
                template,
                parent: None,
            },
        );
    }

    /// Get a layout by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Layout> {
        self.layouts.get(name)
    }

    /// Check if a layout exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.layouts.contains_key(name)
    }

    /// Number of registered layouts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}

fn layout_name(dir: &Path, path: &Path) -> String {
    let relative: PathBuf = path
        .strip_prefix(dir)
        .unwrap_or(path)
        .with_extension("");
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_template_simple_render() {
        let template = Template::new("test", "Hello, {{ name }}!");
        let ctx = TemplateContext::new().with_var("name", "World");

        let result = template.render(&ctx);
        assert_eq!(result.html, "Hello, World!");
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_template_without_spaces() {
        let template = Template::new("post", "<html><body>{{title}}{{content}}</body></html>");
        let ctx = TemplateContext::new()
            .with_var("title", "A")
            .with_var("content", "<h1>Hi</h1>");

        assert_eq!(
            template.render(&ctx).html,
            "<html><body>A<h1>Hi</h1></body></html>"
        );
    }

    #[test]
    fn test_template_multiple_variables() {
        let template = Template::new(
            "test",
            "{{ greeting }}, {{ name }}! Welcome to {{ place }}.",
        );
        let ctx = TemplateContext::new()
            .with_var("greeting", "Hello")
            .with_var("name", "User")
            .with_var("place", "Quire");

        assert_eq!(template.render(&ctx).html, "Hello, User! Welcome to Quire.");
    }

    #[test]
    fn test_template_missing_variable_renders_empty() {
        let template = Template::new("test", "Hello, {{ name }}{{ other }}!");
        let result = template.render(&TemplateContext::new());

        assert_eq!(result.html, "Hello, !");
        assert_eq!(result.missing, vec!["name", "other"]);
    }

    #[test]
    fn test_template_optional_variable() {
        let template = Template::new("test", "Hello{{ suffix? }}!");

        let result = template.render(&TemplateContext::new());
        assert_eq!(result.html, "Hello!");
        assert!(result.missing.is_empty());

        let ctx = TemplateContext::new().with_var("suffix", ", World");
        assert_eq!(template.render(&ctx).html, "Hello, World!");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let template = Template::new("test", "{{ content }}");
        let ctx = TemplateContext::new().with_var("content", "literal {{ title }}");

        let result = template.render(&ctx);
        assert_eq!(result.html, "literal {{ title }}");
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_unclosed_placeholder_is_literal() {
        let template = Template::new("test", "a {{ b }} c {{ d");
        let ctx = TemplateContext::new().with_var("b", "B");
        assert_eq!(template.render(&ctx).html, "a B c {{ d");
    }

    #[test]
    fn test_layout_parent() {
        let layout = Layout::parse(
            "post",
            "---\nlayout: base\n---\n<article>{{ content }}</article>",
            Path::new("post.html"),
        )
        .expect("parse");
        assert_eq!(layout.parent.as_deref(), Some("base"));
        assert_eq!(
            layout.template.render(&TemplateContext::new().with_var("content", "x")).html,
            "<article>x</article>"
        );
    }

    #[test]
    fn test_registry_load() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("base.html"), "<html>{{ content }}</html>").unwrap();
        fs::create_dir_all(dir.path().join("partials")).unwrap();
        fs::write(dir.path().join("partials/card.html"), "<div></div>").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let registry = LayoutRegistry::load(dir.path()).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("base"));
        assert!(registry.contains("partials/card"));
        assert!(registry.get("notes").is_none());
    }

    #[test]
    fn test_registry_missing_dir() {
        let registry = LayoutRegistry::load(Path::new("/nonexistent/layouts")).unwrap();
        assert!(registry.is_empty());
    }
}
