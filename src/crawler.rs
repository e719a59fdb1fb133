//! Website fetching and bounded crawling
//!
//! This module provides the HTTP fetcher, same-origin link discovery and the
//! breadth-first crawler that feeds item extraction. Pages are fetched once
//! and returned with their HTML so later stages never re-download them.

mod bfs;
mod config;
pub mod content_extraction;
mod error;
mod fetcher;
mod links;

pub use bfs::Crawler;
pub use config::{CrawlerConfig, CrawlerConfigBuilder, DEFAULT_EXCLUDE_PATTERN};
pub use error::FetchError;
pub use fetcher::{
    Fetcher, FetcherConfig, BROWSER_USER_AGENT, IMAGE_PAGE_TIMEOUT, IMAGE_PROBE_TIMEOUT,
    PAGE_TIMEOUT, SEED_TIMEOUT, SUBPAGE_TIMEOUT,
};
pub use links::{extract_links, select_links, LinkFilter};

use url::Url;

/// A URL waiting in the crawl queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    /// Absolute URL without fragment
    pub url: Url,
}

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct CrawledPage {
    /// URL of the page
    pub url: String,

    /// Raw HTML body
    pub html: String,
}

/// Parse a user-supplied URL, requiring an http(s) scheme
pub fn parse_http_url(input: &str) -> Option<Url> {
    Url::parse(input.trim())
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}
