//! Document types and output path rules.

use std::path::{Component, Path, PathBuf};

use chrono::NaiveDate;

use crate::frontmatter::FrontMatter;

/// Markup format of a document body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Markdown content (.md files).
    Markdown,
    /// HTML fragment used verbatim (.html files).
    Html,
}

impl Format {
    /// Determine the format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }

    /// Determine the format from a `format` front-matter value.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "markdown" | "md" | "commonmark" => Some(Self::Markdown),
            "html" => Some(Self::Html),
            _ => None,
        }
    }

    /// Canonical name of the format.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
        }
    }
}

/// A source document with front-matter.
#[derive(Debug, Clone)]
pub struct Document {
    /// Source path relative to the content root; the document's identity.
    pub source: PathBuf,

    /// Parsed front-matter.
    pub front: FrontMatter,

    /// Raw body text (without front-matter).
    pub body: String,

    /// Markup format of the body.
    pub format: Format,

    /// Output path relative to the output directory.
    pub output: PathBuf,

    /// Rendered HTML fragment, filled in by the renderer.
    pub html: Option<String>,
}

impl Document {
    /// Page title.
    pub fn title(&self) -> String {
        self.front.title()
    }

    /// Publication date; documents with a date are posts.
    pub fn date(&self) -> Option<NaiveDate> {
        self.front.date()
    }

    /// Site-relative URL of the output page.
    pub fn url(&self) -> String {
        url_for_output(&self.output)
    }

    /// Attach the rendered fragment.
    #[must_use]
    pub fn with_html(mut self, html: String) -> Self {
        self.html = Some(html);
        self
    }
}

/// A file copied to the output without transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passthrough {
    /// Absolute (or working-directory relative) path of the source file.
    pub source: PathBuf,

    /// Output path relative to the output directory.
    pub output: PathBuf,
}

/// Compute the output path for a document.
///
/// - `posts/hello.md` -> `posts/hello/index.html`
/// - `posts/index.md` -> `posts/index.html`
/// - permalink `/about/` -> `about/index.html`
/// - permalink `/feed/atom.xml` -> `feed/atom.xml`
///
/// Returns `None` when the path would leave the output directory.
pub fn output_path(source: &Path, permalink: Option<&str>) -> Option<PathBuf> {
    if let Some(link) = permalink {
        let link = link.trim();
        let mut out = PathBuf::new();
        for part in link.split('/').filter(|p| !p.is_empty()) {
            if part == ".." || part == "." {
                return None;
            }
            out.push(part);
        }
        if link.ends_with('/') || out.extension().is_none() {
            out.push("index.html");
        }
        return Some(out);
    }

    if !source.components().all(|c| matches!(c, Component::Normal(_))) {
        return None;
    }

    let stem = source.file_stem()?.to_str()?;
    let parent = source.parent().unwrap_or(Path::new(""));
    if stem == "index" {
        Some(parent.join("index.html"))
    } else {
        Some(parent.join(stem).join("index.html"))
    }
}

/// Site-relative URL for an output path (`about/index.html` -> `/about/`).
pub fn url_for_output(output: &Path) -> String {
    let parts: Vec<_> = output
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();

    match parts.split_last() {
        Some((last, dirs)) if last == "index.html" => {
            if dirs.is_empty() {
                "/".to_string()
            } else {
                format!("/{}/", dirs.join("/"))
            }
        }
        _ => format!("/{}", parts.join("/")),
    }
}

/// Convert text to a URL-safe slug.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|c| *c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::FrontValue;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_extension("md"), Some(Format::Markdown));
        assert_eq!(Format::from_extension("MD"), Some(Format::Markdown));
        assert_eq!(Format::from_extension("html"), Some(Format::Html));
        assert_eq!(Format::from_extension("txt"), None);
    }

    #[test]
    fn test_format_from_name() {
        assert_eq!(Format::from_name("Markdown"), Some(Format::Markdown));
        assert_eq!(Format::from_name("html"), Some(Format::Html));
        assert_eq!(Format::from_name("asciidoc"), None);
    }

    #[test]
    fn test_output_path_from_source() {
        assert_eq!(
            output_path(Path::new("posts/hello.md"), None),
            Some(PathBuf::from("posts/hello/index.html"))
        );
        assert_eq!(
            output_path(Path::new("posts/index.md"), None),
            Some(PathBuf::from("posts/index.html"))
        );
        assert_eq!(
            output_path(Path::new("index.md"), None),
            Some(PathBuf::from("index.html"))
        );
        assert_eq!(output_path(Path::new("../escape.md"), None), None);
    }

    #[test]
    fn test_output_path_from_permalink() {
        let src = Path::new("anything.md");
        assert_eq!(
            output_path(src, Some("/about/")),
            Some(PathBuf::from("about/index.html"))
        );
        assert_eq!(
            output_path(src, Some("/about")),
            Some(PathBuf::from("about/index.html"))
        );
        assert_eq!(
            output_path(src, Some("/feed/atom.xml")),
            Some(PathBuf::from("feed/atom.xml"))
        );
        assert_eq!(output_path(src, Some("/")), Some(PathBuf::from("index.html")));
        assert_eq!(output_path(src, Some("/../etc/passwd")), None);
    }

    #[test]
    fn test_url_for_output() {
        assert_eq!(url_for_output(Path::new("index.html")), "/");
        assert_eq!(url_for_output(Path::new("posts/a/index.html")), "/posts/a/");
        assert_eq!(url_for_output(Path::new("rss.xml")), "/rss.xml");
    }

    #[test]
    fn test_document_accessors() {
        let mut front = FrontMatter::new();
        front.insert("title", FrontValue::String("A".to_string()));
        front.insert(
            "date",
            FrontValue::Date(NaiveDate::from_ymd_opt(2023, 1, 1).expect("date")),
        );
        let doc = Document {
            source: PathBuf::from("posts/a.md"),
            front,
            body: "# Hi".to_string(),
            format: Format::Markdown,
            output: PathBuf::from("posts/a/index.html"),
            html: None,
        };

        assert_eq!(doc.title(), "A");
        assert!(doc.date().is_some());
        assert_eq!(doc.url(), "/posts/a/");
        assert_eq!(doc.with_html("<h1>Hi</h1>".into()).html.as_deref(), Some("<h1>Hi</h1>"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Test 123 Post"), "test-123-post");
        assert_eq!(slugify("Multiple   Spaces"), "multiple-spaces");
        assert_eq!(slugify("Special!@#Chars"), "specialchars");
    }
}
