//! Page composition: rendered fragments merged into layouts.

use std::path::{Path, PathBuf};

use quire_core::{Document, document::url_for_output};
use quire_parser::escape_html;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    collections::{PostEntry, SiteContext, paginate},
    template::{LayoutRegistry, TemplateContext},
};

/// Longest allowed chain of parent layouts.
pub const MAX_LAYOUT_DEPTH: usize = 16;

/// Composition errors.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// A document or collection asked for a layout that does not exist.
    #[error("unknown layout: {0}")]
    UnknownLayout(String),

    /// Parent layouts loop or nest too deeply.
    #[error("layout chain starting at `{0}` is cyclic or deeper than {max}", max = MAX_LAYOUT_DEPTH)]
    LayoutCycle(String),
}

/// Result type for composition.
pub type Result<T> = std::result::Result<T, ComposeError>;

/// A fully composed page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPage {
    /// Output path relative to the output directory.
    pub output: PathBuf,
    /// Final HTML.
    pub html: String,
    /// Unresolved placeholder warnings.
    pub warnings: Vec<String>,
}

/// Merges fragments with layouts and site-wide variables.
#[derive(Debug)]
pub struct Composer<'a> {
    layouts: &'a LayoutRegistry,
    site: &'a SiteContext<'a>,
    base: TemplateContext,
}

impl<'a> Composer<'a> {
    /// Create a composer; site-wide variables are computed once here.
    pub fn new(layouts: &'a LayoutRegistry, site: &'a SiteContext<'a>) -> Self {
        let config = site.config;
        let mut base = TemplateContext::new()
            .with_var("site_title", escape_html(&config.site.title))
            .with_var("base_url", escape_html(&config.site.base_url))
            .with_var("nav", nav_html(site))
            .with_var("recent_posts", post_list_html(site.recent_posts(), "recent-posts"));
        base.insert(
            "site_description",
            escape_html(config.site.description.as_deref().unwrap_or_default()),
        );
        base.insert(
            "site_author",
            escape_html(config.site.author.as_deref().unwrap_or_default()),
        );

        Self {
            layouts,
            site,
            base,
        }
    }

    /// Compose a rendered document into its page.
    ///
    /// Documents without a `layout` key fall back to the default layout, or to
    /// the bare fragment when no default layout exists.
    pub fn compose_document(&self, doc: &Document) -> Result<ComposedPage> {
        let fragment = doc.html.clone().unwrap_or_default();
        let label = doc.source.display().to_string();

        let layout = match doc.front.layout() {
            Some(name) => Some(name),
            None => {
                let default = self.site.config.build.default_layout.as_str();
                self.layouts.contains(default).then_some(default)
            }
        };

        let Some(layout) = layout else {
            debug!(path = %label, "no layout, writing bare fragment");
            return Ok(ComposedPage {
                output: doc.output.clone(),
                html: fragment,
                warnings: Vec::new(),
            });
        };

        let mut ctx = self.base.clone();
        for (key, value) in doc.front.iter() {
            ctx.insert(key, escape_html(&value.to_string()));
        }
        ctx.insert("title", escape_html(&doc.title()));
        ctx.insert(
            "date",
            doc.date()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        );
        ctx.insert("url", doc.url());
        ctx.insert("path", escape_html(&doc.source.to_string_lossy()));
        ctx.insert("layout", escape_html(layout));
        ctx.insert("tags", self.tag_links_html(&doc.front.tags()));
        ctx.insert("content", fragment);

        let (html, warnings) = self.apply_layout(layout, ctx, &label)?;
        Ok(ComposedPage {
            output: doc.output.clone(),
            html,
            warnings,
        })
    }

    /// Compose the paginated post index, if an index layout is configured.
    pub fn index_pages(&self) -> Vec<(PathBuf, Result<ComposedPage>)> {
        let collections = &self.site.config.collections;
        let Some(layout) = collections.index_layout.as_deref() else {
            return Vec::new();
        };

        let dir = collections.index_dir.trim_matches('/');
        let (_, total) = paginate(&self.site.posts, 1, collections.paginate);

        (1..=total)
            .map(|number| {
                let output = index_page_path(dir, number);
                let (items, _) = paginate(&self.site.posts, number, collections.paginate);
                let pagination = pagination_html(number, total, |n| {
                    url_for_output(&index_page_path(dir, n))
                });

                let mut ctx = self.list_context("Posts", items.iter(), &output);
                ctx.insert("pagination", pagination);
                ctx.insert("page_number", number.to_string());
                ctx.insert("total_pages", total.to_string());

                let label = output.display().to_string();
                let page = self
                    .apply_layout(layout, ctx, &label)
                    .map(|(html, warnings)| ComposedPage {
                        output: output.clone(),
                        html,
                        warnings,
                    });
                (output, page)
            })
            .collect()
    }

    /// Compose one page per tag, if a tag layout is configured.
    pub fn tag_pages(&self) -> Vec<(PathBuf, Result<ComposedPage>)> {
        let Some(layout) = self.site.config.collections.tag_layout.as_deref() else {
            return Vec::new();
        };

        self.site
            .tags
            .iter()
            .map(|(slug, group)| {
                let output = tag_page_path(slug);
                let posts = self.site.tag_posts(group);

                let mut ctx = self.list_context(&group.name, posts.into_iter(), &output);
                ctx.insert("tag", escape_html(&group.name));
                ctx.insert("pagination", String::new());

                let label = output.display().to_string();
                let page = self
                    .apply_layout(layout, ctx, &label)
                    .map(|(html, warnings)| ComposedPage {
                        output: output.clone(),
                        html,
                        warnings,
                    });
                (output, page)
            })
            .collect()
    }

    fn list_context<'p>(
        &self,
        title: &str,
        posts: impl Iterator<Item = &'p PostEntry>,
        output: &Path,
    ) -> TemplateContext {
        let items: String = posts.map(post_item_html).collect();
        self.base
            .clone()
            .with_var("title", escape_html(title))
            .with_var("items", items)
            .with_var("url", url_for_output(output))
            .with_var("content", String::new())
    }

    /// Render `content` through `layout` and each of its parents.
    fn apply_layout(
        &self,
        layout: &str,
        mut ctx: TemplateContext,
        label: &str,
    ) -> Result<(String, Vec<String>)> {
        let mut warnings = Vec::new();
        let mut current = Some(layout.to_string());
        let mut depth = 0;

        while let Some(name) = current {
            depth += 1;
            if depth > MAX_LAYOUT_DEPTH {
                return Err(ComposeError::LayoutCycle(layout.to_string()));
            }

            let entry = self
                .layouts
                .get(&name)
                .ok_or_else(|| ComposeError::UnknownLayout(name.clone()))?;

            let rendered = entry.template.render(&ctx);
            for var in rendered.missing {
                warn!(page = %label, layout = %name, variable = %var, "unresolved placeholder");
                warnings.push(format!(
                    "{label}: unresolved placeholder `{var}` in layout `{name}`"
                ));
            }

            ctx.insert("content", rendered.html);
            current = entry.parent.clone();
        }

        Ok((ctx.get("content").unwrap_or_default().to_string(), warnings))
    }

    fn tag_links_html(&self, tags: &[String]) -> String {
        let linked = self.site.config.collections.tag_layout.is_some();
        tags.iter()
            .filter_map(|tag| {
                let slug = quire_core::document::slugify(tag);
                if slug.is_empty() {
                    return None;
                }
                let name = escape_html(tag);
                Some(if linked {
                    format!(
                        "<a class=\"tag\" href=\"{}\">{name}</a>",
                        url_for_output(&tag_page_path(&slug))
                    )
                } else {
                    format!("<span class=\"tag\">{name}</span>")
                })
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Output path of a post index page.
pub fn index_page_path(dir: &str, number: usize) -> PathBuf {
    let base = PathBuf::from(dir);
    if number <= 1 {
        base.join("index.html")
    } else {
        base.join("page").join(number.to_string()).join("index.html")
    }
}

/// Output path of a tag page.
pub fn tag_page_path(slug: &str) -> PathBuf {
    PathBuf::from("tags").join(slug).join("index.html")
}

fn nav_html(site: &SiteContext<'_>) -> String {
    let nav = &site.config.site.nav;
    if nav.is_empty() {
        return String::new();
    }
    let items: String = nav
        .iter()
        .map(|item| {
            format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                escape_html(&item.url),
                escape_html(&item.name)
            )
        })
        .collect();
    format!("<ul class=\"nav\">\n{items}</ul>")
}

fn post_item_html(post: &PostEntry) -> String {
    let date = post.date.format("%Y-%m-%d");
    format!(
        "<li><a href=\"{}\">{}</a> <time datetime=\"{date}\">{date}</time></li>\n",
        escape_html(&post.url),
        escape_html(&post.title)
    )
}

fn post_list_html(posts: &[PostEntry], class: &str) -> String {
    if posts.is_empty() {
        return String::new();
    }
    let items: String = posts.iter().map(post_item_html).collect();
    format!("<ul class=\"{class}\">\n{items}</ul>")
}

fn pagination_html(current: usize, total: usize, url_of: impl Fn(usize) -> String) -> String {
    if total <= 1 {
        return String::new();
    }

    let mut html = String::from("<nav class=\"pagination\">");
    if current > 1 {
        html.push_str(&format!(
            "<a rel=\"prev\" href=\"{}\">Newer</a> ",
            url_of(current - 1)
        ));
    }
    html.push_str(&format!("<span>Page {current} of {total}</span>"));
    if current < total {
        html.push_str(&format!(
            " <a rel=\"next\" href=\"{}\">Older</a>",
            url_of(current + 1)
        ));
    }
    html.push_str("</nav>");
    html
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use quire_core::{Config, Format, FrontMatter, FrontValue, config::NavItem};

    use super::*;

    fn doc(source: &str, front: &[(&str, FrontValue)], html: &str) -> Document {
        let mut fm = FrontMatter::new();
        for (k, v) in front {
            fm.insert(*k, v.clone());
        }
        let source = PathBuf::from(source);
        let output = quire_core::document::output_path(&source, fm.permalink()).unwrap();
        Document {
            source,
            front: fm,
            body: "body".to_string(),
            format: Format::Markdown,
            output,
            html: Some(html.to_string()),
        }
    }

    fn s(v: &str) -> FrontValue {
        FrontValue::String(v.to_string())
    }

    fn d(v: &str) -> FrontValue {
        FrontValue::Date(NaiveDate::parse_from_str(v, "%Y-%m-%d").unwrap())
    }

    #[test]
    fn test_compose_example_page() {
        let config = Config::new("Site", "https://example.com");
        let post = doc(
            "posts/a.md",
            &[("title", s("A")), ("date", d("2023-01-01")), ("layout", s("post"))],
            "<h1>Hi</h1>\n",
        );
        let docs = vec![post.clone()];
        let site = SiteContext::new(&config, &docs);
        let mut layouts = LayoutRegistry::new();
        layouts.register_text("post", "<html><body>{{title}}{{content}}</body></html>");

        let page = Composer::new(&layouts, &site).compose_document(&post).unwrap();
        let compact: String = page.html.split_whitespace().collect();
        assert_eq!(compact, "<html><body>A<h1>Hi</h1></body></html>");
        assert_eq!(page.output, PathBuf::from("posts/a/index.html"));
        assert!(page.warnings.is_empty());
    }

    #[test]
    fn test_unknown_layout() {
        let config = Config::new("Site", "https://example.com");
        let post = doc("a.md", &[("layout", s("missing"))], "<p>x</p>");
        let site = SiteContext::new(&config, &[]);
        let layouts = LayoutRegistry::new();

        let err = Composer::new(&layouts, &site).compose_document(&post).unwrap_err();
        assert!(matches!(err, ComposeError::UnknownLayout(name) if name == "missing"));
    }

    #[test]
    fn test_default_layout_and_bare_fragment() {
        let config = Config::new("Site", "https://example.com");
        let page_doc = doc("about.md", &[("title", s("About"))], "<p>me</p>");
        let site = SiteContext::new(&config, &[]);

        let layouts = LayoutRegistry::new();
        let page = Composer::new(&layouts, &site).compose_document(&page_doc).unwrap();
        assert_eq!(page.html, "<p>me</p>");

        let mut layouts = LayoutRegistry::new();
        layouts.register_text("default", "<main>{{ title }}: {{ content }}</main>");
        let page = Composer::new(&layouts, &site).compose_document(&page_doc).unwrap();
        assert_eq!(page.html, "<main>About: <p>me</p></main>");
    }

    #[test]
    fn test_unresolved_placeholder_warns() {
        let config = Config::new("Site", "https://example.com");
        let page_doc = doc("a.md", &[("layout", s("l"))], "x");
        let site = SiteContext::new(&config, &[]);
        let mut layouts = LayoutRegistry::new();
        layouts.register_text("l", "[{{ nope }}][{{ quiet? }}]{{ content }}");

        let page = Composer::new(&layouts, &site).compose_document(&page_doc).unwrap();
        assert_eq!(page.html, "[][]x");
        assert_eq!(page.warnings.len(), 1);
        assert!(page.warnings[0].contains("nope"));
    }

    #[test]
    fn test_front_matter_and_site_variables() {
        let mut config = Config::new("My <Site>", "https://example.com");
        config.site.nav.push(NavItem {
            name: "About".to_string(),
            url: "/about/".to_string(),
        });
        let page_doc = doc(
            "a.md",
            &[
                ("layout", s("l")),
                ("title", s("Fish & Chips")),
                ("series", s("food")),
                ("tags", FrontValue::List(vec!["Rust".into()])),
            ],
            "x",
        );
        let site = SiteContext::new(&config, &[]);
        let mut layouts = LayoutRegistry::new();
        layouts.register_text(
            "l",
            "{{ site_title }}|{{ title }}|{{ series }}|{{ tags }}|{{ nav }}",
        );

        let page = Composer::new(&layouts, &site).compose_document(&page_doc).unwrap();
        assert!(page.html.starts_with("My &lt;Site&gt;|Fish &amp; Chips|food|"));
        assert!(page.html.contains("<span class=\"tag\">Rust</span>"));
        assert!(page.html.contains("<a href=\"/about/\">About</a>"));
    }

    #[test]
    fn test_layout_chain_and_cycle() {
        let config = Config::new("Site", "https://example.com");
        let site = SiteContext::new(&config, &[]);
        let page_doc = doc("a.md", &[("layout", s("post"))], "<p>x</p>");

        let mut layouts = LayoutRegistry::new();
        layouts.register(
            "post",
            crate::template::Layout::parse(
                "post",
                "---\nlayout: base\n---\n<article>{{ content }}</article>",
                Path::new("post.html"),
            )
            .unwrap(),
        );
        layouts.register_text("base", "<body>{{ content }}</body>");
        let page = Composer::new(&layouts, &site).compose_document(&page_doc).unwrap();
        assert_eq!(page.html, "<body><article><p>x</p></article></body>");

        let mut cyclic = LayoutRegistry::new();
        cyclic.register(
            "post",
            crate::template::Layout::parse("post", "---\nlayout: post\n---\n{{ content }}", Path::new("p"))
                .unwrap(),
        );
        let err = Composer::new(&cyclic, &site).compose_document(&page_doc).unwrap_err();
        assert!(matches!(err, ComposeError::LayoutCycle(_)));
    }

    #[test]
    fn test_recent_posts_variable() {
        let config = Config::new("Site", "https://example.com");
        let docs = vec![
            doc("posts/b.md", &[("title", s("B")), ("date", d("2023-01-01"))], "b"),
            doc("posts/a.md", &[("title", s("A")), ("date", d("2023-01-01"))], "a"),
            doc("posts/c.md", &[("title", s("C")), ("date", d("2024-01-01"))], "c"),
        ];
        let site = SiteContext::new(&config, &docs);
        let mut layouts = LayoutRegistry::new();
        layouts.register_text("home", "{{ recent_posts }}");
        let home = doc("index.md", &[("layout", s("home"))], "");

        let page = Composer::new(&layouts, &site).compose_document(&home).unwrap();
        let c = page.html.find(">C<").unwrap();
        let a = page.html.find(">A<").unwrap();
        let b = page.html.find(">B<").unwrap();
        assert!(c < a && a < b);
    }

    #[test]
    fn test_index_and_tag_pages() {
        let mut config = Config::new("Site", "https://example.com");
        config.collections.paginate = 2;
        config.collections.index_layout = Some("list".to_string());
        config.collections.tag_layout = Some("list".to_string());
        let docs = vec![
            doc("posts/a.md", &[("title", s("A")), ("date", d("2023-01-01")), ("tags", s("rust"))], "a"),
            doc("posts/b.md", &[("title", s("B")), ("date", d("2023-01-02"))], "b"),
            doc("posts/c.md", &[("title", s("C")), ("date", d("2023-01-03")), ("tags", s("rust"))], "c"),
        ];
        let site = SiteContext::new(&config, &docs);
        let mut layouts = LayoutRegistry::new();
        layouts.register_text("list", "<h1>{{ title }}</h1><ul>{{ items }}</ul>{{ pagination }}");
        let composer = Composer::new(&layouts, &site);

        let index = composer.index_pages();
        assert_eq!(index.len(), 2);
        assert_eq!(index[0].0, PathBuf::from("posts/index.html"));
        assert_eq!(index[1].0, PathBuf::from("posts/page/2/index.html"));
        let first = index[0].1.as_ref().unwrap();
        assert!(first.html.contains(">C<"));
        assert!(first.html.contains(">B<"));
        assert!(!first.html.contains(">A<"));
        assert!(first.html.contains("href=\"/posts/page/2/\""));

        let tags = composer.tag_pages();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].0, PathBuf::from("tags/rust/index.html"));
        let page = tags[0].1.as_ref().unwrap();
        assert!(page.html.starts_with("<h1>rust</h1>"));
        assert!(page.html.find(">C<").unwrap() < page.html.find(">A<").unwrap());
    }

    #[test]
    fn test_pagination_html() {
        assert_eq!(pagination_html(1, 1, |n| n.to_string()), "");
        let html = pagination_html(2, 3, |n| format!("/p/{n}/"));
        assert!(html.contains("rel=\"prev\" href=\"/p/1/\""));
        assert!(html.contains("rel=\"next\" href=\"/p/3/\""));
    }
}
