//! HTTP page fetching with browser-like headers

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::crawler::error::FetchError;

/// Desktop Chrome user agent; many sites refuse obvious bots outright
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Timeout for the seed page of a session
pub const SEED_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for pages fetched while crawling
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for the extra pages the news scanner looks at
pub const SUBPAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for article pages searched for a lead image
pub const IMAGE_PAGE_TIMEOUT: Duration = Duration::from_secs(8);

/// Timeout for the HEAD probe that checks an image URL
pub const IMAGE_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Configuration for the fetcher
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// User agent sent with every request
    pub user_agent: String,

    /// Default per-request timeout
    pub timeout: Duration,

    /// Bodies shorter than this are rejected as empty
    pub min_body_len: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            timeout: SEED_TIMEOUT,
            min_body_len: 100,
        }
    }
}

/// Fetches HTML pages; cheap to clone
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    config: FetcherConfig,
}

impl Fetcher {
    /// Create a fetcher with the given configuration
    pub fn new(config: FetcherConfig) -> reqwest::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.5"),
        );
        headers.insert(header::DNT, HeaderValue::from_static("1"));
        headers.insert(
            header::UPGRADE_INSECURE_REQUESTS,
            HeaderValue::from_static("1"),
        );

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, config })
    }

    /// The configuration this fetcher was built with
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Fetch a page using the default timeout
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.fetch_with_timeout(url, self.config.timeout).await
    }

    /// Fetch a page and return its HTML body
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_with_timeout(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<String, FetchError> {
        let parsed = Url::parse(url)?;

        let response = self
            .client
            .get(parsed)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} returned {}", url, status);
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if !content_type.contains("text/html") {
            return Err(FetchError::ContentType { content_type });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        if body.len() < self.config.min_body_len {
            return Err(FetchError::EmptyBody { len: body.len() });
        }

        debug!("Fetched {} ({} bytes)", url, body.len());
        Ok(body)
    }

    /// Check that a URL answers a HEAD request with an image content-type
    #[instrument(skip(self), level = "debug")]
    pub async fn probe_image(&self, url: &str) -> bool {
        let response = match self
            .client
            .head(url)
            .timeout(IMAGE_PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!("Image probe failed for {}: {}", url, e);
                return false;
            }
        };

        response.status().is_success()
            && response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .is_some_and(|ct| ct.starts_with("image/"))
    }
}
