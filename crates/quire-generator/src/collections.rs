//! Derived collections computed from the full document set.

use std::{collections::BTreeMap, path::PathBuf};

use chrono::NaiveDate;
use quire_core::{Config, Document, document::slugify};

/// A post as seen by listings and the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct PostEntry {
    /// Source path relative to the content root.
    pub source: PathBuf,
    /// Post title.
    pub title: String,
    /// Publication date.
    pub date: NaiveDate,
    /// Site-relative URL.
    pub url: String,
    /// Tags in front-matter order.
    pub tags: Vec<String>,
    /// Rendered body.
    pub html: String,
}

/// Posts sharing a tag.
#[derive(Debug, Clone, PartialEq)]
pub struct TagGroup {
    /// Tag as first written by a post.
    pub name: String,
    /// Indices into [`SiteContext::posts`], in post order.
    pub posts: Vec<usize>,
}

/// Site configuration plus the collections derived from every rendered document.
#[derive(Debug)]
pub struct SiteContext<'a> {
    /// Site configuration.
    pub config: &'a Config,
    /// Posts, newest first; equal dates ordered by source path.
    pub posts: Vec<PostEntry>,
    /// Tag slug -> posts with that tag.
    pub tags: BTreeMap<String, TagGroup>,
}

impl<'a> SiteContext<'a> {
    /// Build the context from rendered documents.
    pub fn new(config: &'a Config, documents: &[Document]) -> Self {
        let mut posts: Vec<PostEntry> = documents
            .iter()
            .filter_map(|doc| {
                Some(PostEntry {
                    source: doc.source.clone(),
                    title: doc.title(),
                    date: doc.date()?,
                    url: doc.url(),
                    tags: doc.front.tags(),
                    html: doc.html.clone().unwrap_or_default(),
                })
            })
            .collect();

        sort_posts(&mut posts);

        let mut tags: BTreeMap<String, TagGroup> = BTreeMap::new();
        for (index, post) in posts.iter().enumerate() {
            for tag in &post.tags {
                let slug = slugify(tag);
                if slug.is_empty() {
                    continue;
                }
                let group = tags.entry(slug).or_insert_with(|| TagGroup {
                    name: tag.clone(),
                    posts: Vec::new(),
                });
                if group.posts.last() != Some(&index) {
                    group.posts.push(index);
                }
            }
        }

        Self {
            config,
            posts,
            tags,
        }
    }

    /// The newest posts, as many as `collections.recent_posts`.
    pub fn recent_posts(&self) -> &[PostEntry] {
        let n = self.config.collections.recent_posts.min(self.posts.len());
        &self.posts[..n]
    }

    /// Posts of a tag group.
    pub fn tag_posts(&self, group: &TagGroup) -> Vec<&PostEntry> {
        group.posts.iter().filter_map(|&i| self.posts.get(i)).collect()
    }
}

/// Sort posts by date descending, ties broken by source path ascending.
pub fn sort_posts(posts: &mut [PostEntry]) {
    posts.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| a.source.to_string_lossy().cmp(&b.source.to_string_lossy()))
    });
}

/// Paginate a slice of items.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> (&[T], usize) {
    let per_page = per_page.max(1);
    let total_pages = items.len().div_ceil(per_page).max(1);
    let start = page.saturating_sub(1) * per_page;
    let end = (start + per_page).min(items.len());

    if start >= items.len() {
        (&[], total_pages)
    } else {
        (&items[start..end], total_pages)
    }
}

#[cfg(test)]
mod tests {
    use quire_core::{Format, FrontMatter, FrontValue};

    use super::*;

    fn post(source: &str, title: &str, date: &str, tags: &[&str]) -> Document {
        let mut front = FrontMatter::new();
        front.insert("title", FrontValue::String(title.to_string()));
        front.insert(
            "date",
            FrontValue::Date(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()),
        );
        if !tags.is_empty() {
            front.insert(
                "tags",
                FrontValue::List(tags.iter().map(|t| t.to_string()).collect()),
            );
        }
        let source = PathBuf::from(source);
        let output = quire_core::document::output_path(&source, None).unwrap();
        Document {
            source,
            front,
            body: "body".to_string(),
            format: Format::Markdown,
            output,
            html: Some("<p>body</p>".to_string()),
        }
    }

    fn page(source: &str) -> Document {
        let mut doc = post(source, "Page", "2020-01-01", &[]);
        doc.front = FrontMatter::new();
        doc
    }

    #[test]
    fn test_posts_sorted_by_date_then_path() {
        let config = Config::new("T", "https://example.com");
        let docs = vec![
            post("posts/c.md", "C", "2023-01-01", &[]),
            post("posts/old.md", "Old", "2022-06-01", &[]),
            post("posts/a.md", "A", "2023-01-01", &[]),
            post("posts/new.md", "New", "2024-02-02", &[]),
            page("about.md"),
        ];

        let site = SiteContext::new(&config, &docs);
        let titles: Vec<_> = site.posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["New", "A", "C", "Old"]);
    }

    #[test]
    fn test_recent_posts_limit() {
        let mut config = Config::new("T", "https://example.com");
        config.collections.recent_posts = 2;
        let docs = vec![
            post("posts/a.md", "A", "2023-01-01", &[]),
            post("posts/b.md", "B", "2023-01-02", &[]),
            post("posts/c.md", "C", "2023-01-03", &[]),
        ];

        let site = SiteContext::new(&config, &docs);
        let titles: Vec<_> = site.recent_posts().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "B"]);
    }

    #[test]
    fn test_tag_groups() {
        let config = Config::new("T", "https://example.com");
        let docs = vec![
            post("posts/a.md", "A", "2023-01-01", &["Rust", "web"]),
            post("posts/b.md", "B", "2023-01-02", &["rust"]),
        ];

        let site = SiteContext::new(&config, &docs);
        assert_eq!(site.tags.keys().collect::<Vec<_>>(), vec!["rust", "web"]);

        let rust = &site.tags["rust"];
        assert_eq!(rust.name, "rust");
        let titles: Vec<_> = site.tag_posts(rust).iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A"]);
    }

    #[test]
    fn test_paginate() {
        let items = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10];

        let (page1, total) = paginate(&items, 1, 3);
        assert_eq!(page1, &[1, 2, 3]);
        assert_eq!(total, 4);

        let (page4, _) = paginate(&items, 4, 3);
        assert_eq!(page4, &[10]);

        let (page5, _) = paginate(&items, 5, 3);
        assert!(page5.is_empty());

        let empty: Vec<i32> = Vec::new();
        let (page, total) = paginate(&empty, 1, 3);
        assert!(page.is_empty());
        assert_eq!(total, 1);
    }
}
