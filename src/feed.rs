//! # Feed rendering
//!
//! A `FeedDocument` is assembled once from the final, ranked items and then
//! handed to a renderer: RSS 2.0 XML (`rss`) or the magazine HTML page
//! (`magazine`).

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::extract::ContentItem;

pub mod magazine;
pub mod rss;

pub use magazine::{
    article_images, find_article_image, render_magazine, with_article_images, DEFAULT_LAYOUT,
};
pub use rss::{render_rss, render_rss_at};

/// Generator name written into feeds
pub const GENERATOR: &str = concat!("pagefeed/", env!("CARGO_PKG_VERSION"));

/// Error type for feed rendering
#[derive(Debug, Error)]
pub enum FeedError {
    /// XML serialization failed
    #[error("XML serialization error: {0}")]
    Serialize(#[from] quick_xml::errors::serialize::SeError),
}

/// Everything a renderer needs; never modified once built
#[derive(Debug, Clone, PartialEq)]
pub struct FeedDocument {
    pub title: String,
    pub description: String,
    pub site_url: String,
    pub feed_url: String,
    pub items: Vec<ContentItem>,
    /// Distinct item categories in first-seen order
    pub categories: Vec<String>,
    pub generator: Option<String>,
    /// Suggested refresh interval in minutes
    pub ttl: Option<u32>,
}

impl FeedDocument {
    /// Build a feed for `site_url`
    pub fn new(
        title: impl Into<String>,
        site_url: impl Into<String>,
        feed_url: impl Into<String>,
        items: Vec<ContentItem>,
    ) -> Self {
        let site_url = site_url.into();
        let mut categories: Vec<String> = Vec::new();
        for category in items.iter().filter_map(|item| item.category) {
            let name = category.to_string();
            if !categories.contains(&name) {
                categories.push(name);
            }
        }

        Self {
            title: title.into(),
            description: format!("RSS feed generated from {site_url}"),
            site_url,
            feed_url: feed_url.into(),
            items,
            categories,
            generator: Some(GENERATOR.to_string()),
            ttl: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_ttl(mut self, minutes: u32) -> Self {
        self.ttl = Some(minutes);
        self
    }

    /// JSON preview returned alongside the XML
    pub fn preview(&self) -> FeedPreview {
        FeedPreview {
            title: self.title.clone(),
            description: self.description.clone(),
            items: self.items.clone(),
        }
    }
}

/// Title, description and items of a feed, for display
#[derive(Debug, Clone, Serialize)]
pub struct FeedPreview {
    pub title: String,
    pub description: String,
    pub items: Vec<ContentItem>,
}

/// URL a generated feed is announced under
pub fn feed_url(base_url: &str) -> String {
    format!(
        "{}/api/feed/{}",
        base_url.trim_end_matches('/'),
        Utc::now().timestamp_millis()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::Category;

    #[test]
    fn test_feed_url() {
        let url = feed_url("http://localhost:3000/");
        let id = url
            .strip_prefix("http://localhost:3000/api/feed/")
            .unwrap();
        assert!(id.parse::<i64>().unwrap() > 0);
    }

    #[test]
    fn test_categories_are_distinct_in_order() {
        let mut items = Vec::new();
        for (i, category) in [Category::World, Category::Sports, Category::World]
            .into_iter()
            .enumerate()
        {
            let mut item = ContentItem::new(
                i.to_string(),
                format!("Story {i}"),
                format!("https://example.com/{i}"),
                "",
                "https://example.com/",
            );
            item.category = Some(category);
            items.push(item);
        }

        let doc = FeedDocument::new("News", "https://example.com/", "feed", items);
        assert_eq!(doc.categories, vec!["World", "Sports"]);
        assert_eq!(doc.description, "RSS feed generated from https://example.com/");
    }
}
