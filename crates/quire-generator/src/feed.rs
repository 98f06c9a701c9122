//! RSS feed generation.
//!
//! Produces an RSS 2.0 channel over the newest posts. The channel carries no
//! build timestamp, so unchanged input yields a byte-identical feed.

use chrono::NaiveTime;
use rss::{Category, ChannelBuilder, GuidBuilder, Item, ItemBuilder};
use thiserror::Error;
use tracing::debug;

use crate::collections::{PostEntry, SiteContext};

/// Output path of the feed, relative to the output directory.
pub const FEED_PATH: &str = "rss.xml";

/// Feed generation errors.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The channel could not be serialized.
    #[error("RSS write error: {0}")]
    Write(#[from] rss::Error),

    #[error("RSS output is not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Result type for feed operations.
pub type Result<T> = std::result::Result<T, FeedError>;

/// RSS feed generator.
#[derive(Debug)]
pub struct FeedGenerator<'a> {
    site: &'a SiteContext<'a>,
}

impl<'a> FeedGenerator<'a> {
    /// Create a feed generator over the site's posts.
    #[must_use]
    pub fn new(site: &'a SiteContext<'a>) -> Self {
        Self { site }
    }

    /// Generate the feed XML.
    pub fn generate(&self) -> Result<String> {
        let config = self.site.config;
        let limit = config.feed.limit;
        let items: Vec<Item> = self
            .site
            .posts
            .iter()
            .take(limit)
            .map(|post| self.post_to_item(post))
            .collect();

        debug!(count = items.len(), limit, "generating RSS feed");

        let channel = ChannelBuilder::default()
            .title(&config.site.title)
            .link(config.url_for("/"))
            .description(
                config
                    .site
                    .description
                    .as_deref()
                    .unwrap_or(&config.site.title),
            )
            .items(items)
            .build();

        let bytes = channel.write_to(Vec::new())?;
        Ok(String::from_utf8(bytes)?)
    }

    fn post_to_item(&self, post: &PostEntry) -> Item {
        let config = self.site.config;
        let url = config.url_for(&post.url);
        let guid = GuidBuilder::default().value(&url).permalink(true).build();
        let pub_date = post.date.and_time(NaiveTime::MIN).and_utc().to_rfc2822();

        let mut builder = ItemBuilder::default();
        builder.title(Some(post.title.clone()));
        builder.link(Some(url));
        builder.guid(Some(guid));
        builder.pub_date(Some(pub_date));
        builder.description(Some(post.html.clone()));

        if let Some(author) = &config.site.author {
            builder.author(Some(author.clone()));
        }

        let categories: Vec<_> = post
            .tags
            .iter()
            .map(|tag| Category {
                name: tag.clone(),
                domain: None,
            })
            .collect();
        if !categories.is_empty() {
            builder.categories(categories);
        }

        builder.build()
    }
}
