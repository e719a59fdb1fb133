//! Same-origin link discovery and filtering

use regex::Regex;
use scraper::Html;
use tracing::warn;
use url::{Origin, Position, Url};

use crate::crawler::content_extraction::parse_selector;

/// Schemes that never lead to a crawlable page
const SKIPPED_SCHEMES: &[&str] = &["mailto:", "tel:", "javascript:", "data:"];

/// Extensions of binary, document and asset files
const ASSET_EXTENSIONS: &[&str] = &[
    "pdf", "jpg", "jpeg", "png", "gif", "webp", "svg", "ico", "bmp", "zip", "rar", "gz", "tar",
    "7z", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "mp3", "mp4", "avi", "mov", "wav", "webm",
    "css", "js", "xml", "json", "woff", "woff2", "ttf", "exe", "dmg",
];

/// Decides which hrefs found on a page are worth crawling
#[derive(Debug, Clone)]
pub struct LinkFilter {
    origin: Origin,
    exclude: Vec<Regex>,
}

impl LinkFilter {
    /// Create a filter bound to the seed's origin
    ///
    /// Patterns that fail to compile are logged and ignored.
    pub fn new(seed: &Url, exclude_patterns: &[String]) -> Self {
        let exclude = exclude_patterns
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    warn!("Ignoring invalid exclusion pattern '{}': {}", pattern, e);
                    None
                }
            })
            .collect();

        Self {
            origin: seed.origin(),
            exclude,
        }
    }

    /// Resolve `href` against `base` and return it if it should be crawled
    ///
    /// The returned URL has its fragment stripped.
    pub fn accept(&self, base: &Url, href: &str) -> Option<Url> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            return None;
        }

        let lower = href.to_ascii_lowercase();
        if SKIPPED_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
            return None;
        }

        let mut url = base.join(href).ok()?;
        url.set_fragment(None);

        if !matches!(url.scheme(), "http" | "https") || url.origin() != self.origin {
            return None;
        }

        if has_asset_extension(&url) {
            return None;
        }

        let path_and_query = &url[Position::BeforePath..];
        if self.exclude.iter().any(|regex| regex.is_match(path_and_query)) {
            return None;
        }

        Some(url)
    }
}

fn has_asset_extension(url: &Url) -> bool {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|last| last.rsplit_once('.'))
        .is_some_and(|(_, ext)| ASSET_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Collect crawlable links from a page in discovery order
///
/// Anchors matching `priority_selectors` come first, then every other
/// `a[href]` in document order. Each URL appears once.
pub fn extract_links(
    html: &str,
    base: &Url,
    filter: &LinkFilter,
    priority_selectors: &[String],
) -> Vec<Url> {
    let selectors: Vec<&str> = priority_selectors
        .iter()
        .map(String::as_str)
        .chain(std::iter::once("a[href]"))
        .collect();
    select_links(html, base, filter, &selectors)
}

/// Collect crawlable links from anchors matching any of `selectors`
///
/// Selectors are applied in order; each URL appears once.
pub fn select_links(html: &str, base: &Url, filter: &LinkFilter, selectors: &[&str]) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut links: Vec<Url> = Vec::new();

    for selector in selectors.iter().filter_map(|s| parse_selector(s)) {
        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if let Some(url) = filter.accept(base, href) {
                if !links.contains(&url) {
                    links.push(url);
                }
            }
        }
    }

    links
}
