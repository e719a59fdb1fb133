//! # Crawler Configuration Module
//!
//! Controls for the bounded crawl: page budget, politeness delay, fan-out mode,
//! path exclusions and priority link selectors. Uses a builder pattern for
//! flexible configuration.
//!
//! ## Key Components
//!
//! - `CrawlerConfig`: The main configuration struct with crawler parameters
//! - `CrawlerConfigBuilder`: Builder pattern implementation for easier configuration

use std::time::Duration;

use crate::crawler::fetcher::PAGE_TIMEOUT;

/// Path pattern for account and commerce pages that never hold feed content
pub const DEFAULT_EXCLUDE_PATTERN: &str = r"(?i)/(login|register|cart|checkout|admin|api)(/|$|\?)";

/// Configuration for the crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Maximum number of pages to crawl, including the seed
    pub max_pages: usize,

    /// Delay in milliseconds between successive fetches
    pub delay_ms: u64,

    /// Scan every fetched page for links instead of only the seed
    pub recursive: bool,

    /// Regex patterns; URLs whose path matches any of them are skipped
    pub exclude_paths: Vec<String>,

    /// Anchor selectors whose links are queued before the general scan
    pub priority_selectors: Vec<String>,

    /// Timeout for each non-seed page
    pub page_timeout: Duration,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 50,
            delay_ms: 200,
            recursive: false,
            exclude_paths: vec![DEFAULT_EXCLUDE_PATTERN.to_string()],
            priority_selectors: Vec::new(),
            page_timeout: PAGE_TIMEOUT,
        }
    }
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    /// Set the maximum number of pages to crawl
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    /// Set the delay in milliseconds between requests
    pub fn delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.delay_ms = delay_ms;
        self
    }

    /// Set whether links are followed from every page or only the seed
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.config.recursive = recursive;
        self
    }

    /// Replace the path exclusion patterns; an empty list disables exclusion
    pub fn exclude_paths(mut self, exclude_paths: Vec<String>) -> Self {
        self.config.exclude_paths = exclude_paths;
        self
    }

    /// Set the anchor selectors that are followed first
    pub fn priority_selectors(mut self, priority_selectors: Vec<String>) -> Self {
        self.config.priority_selectors = priority_selectors;
        self
    }

    /// Set the timeout for each non-seed page
    pub fn page_timeout(mut self, page_timeout: Duration) -> Self {
        self.config.page_timeout = page_timeout;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }

    /// Get the politeness delay as a Duration
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CrawlerConfig::default();
        assert_eq!(config.max_pages, 50);
        assert_eq!(config.delay(), Duration::from_millis(200));
        assert!(!config.recursive);
        assert_eq!(config.exclude_paths.len(), 1);
    }

    #[test]
    fn test_builder() {
        let config = CrawlerConfig::builder()
            .max_pages(5)
            .delay_ms(0)
            .recursive(true)
            .exclude_paths(vec![])
            .priority_selectors(vec![".pagination a".to_string()])
            .build();

        assert_eq!(config.max_pages, 5);
        assert_eq!(config.delay_ms, 0);
        assert!(config.recursive);
        assert!(config.exclude_paths.is_empty());
        assert_eq!(config.priority_selectors, vec![".pagination a"]);
    }
}
