//! # News Extraction
//!
//! Model-driven extraction of categorized, ranked news items from a news
//! site. The scanner looks at the seed page plus a few news-section and
//! pagination pages, asks the model for items, runs a broader second pass
//! and per-subpage passes when the haul is thin, then dedupes and ranks.
//!
//! Without a model, or when the model call fails, the selector heuristics
//! run on the seed page instead.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

mod category;
pub mod parse;
pub mod prompts;

pub use category::Category;

use crate::crawler::content_extraction::{
    page_title, prepare_excerpt, truncate_chars, CHROME_SELECTORS,
};
use crate::crawler::{
    parse_http_url, select_links, Fetcher, LinkFilter, SEED_TIMEOUT, SUBPAGE_TIMEOUT,
};
use crate::extract::{extract_items, ContentItem, ExtractOptions, Importance};
use crate::inference::{heuristic_selectors, InferenceError};
use crate::model::SharedModel;
use crate::rank::{dedupe, sort_by_importance, truncate, DedupeKey};
use crate::{Error, Result};

use parse::{normalize_items, parse_news_json, parse_news_lines, Normalization};
use prompts::{
    news_prompt, second_pass_prompt, subpage_prompt, NEWS_PREAMBLE, SECOND_PASS_PREAMBLE,
    SUBPAGE_PREAMBLE,
};

/// Anchors that usually lead to more news
pub const NEWS_LINK_PATTERNS: &[&str] = &[
    "a[href*='/news']",
    "a[href*='/latest']",
    "a[href*='/breaking']",
    "a[href*='/headlines']",
    "a[href*='/stories']",
    "a[href*='/articles']",
    "a[href*='/today']",
    "a[href*='/recent']",
    ".news-section a[href]",
    ".latest-news a[href]",
    ".headlines a[href]",
    ".breaking-news a[href]",
    "a[href*='page=']",
    "a[href*='/page/']",
    ".pagination a[href]",
    ".next a[href]",
    "a[rel='next']",
];

/// Extra pages discovered beyond the seed
pub const MAX_EXTRA_PAGES: usize = 5;

/// Pages whose HTML is combined for the main pass, seed included
pub const COMBINED_PAGES: usize = 3;

/// Subpages scanned one by one when the first passes find too little
pub const SUBPAGE_SCAN_LIMIT: usize = 3;

pub const NEWS_EXCERPT_CHARS: usize = 25_000;
pub const SECOND_PASS_CHARS: usize = 15_000;
pub const SUBPAGE_CHARS: usize = 10_000;

/// Below this many items the scanner keeps looking
pub const TARGET_ITEMS: usize = 10;

/// Items kept after ranking
pub const MAX_NEWS_ITEMS: usize = 20;

const FIRST_PASS: Normalization = Normalization {
    default_importance: Importance::Medium,
    rank_offset: 1,
};
const SECOND_PASS: Normalization = Normalization {
    default_importance: Importance::Low,
    rank_offset: 100,
};
const SUBPAGE_PASS: Normalization = Normalization {
    default_importance: Importance::Medium,
    rank_offset: 50,
};

/// How a scan produced its items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanMethod {
    /// Hosted model analysis
    Model,
    /// Selector heuristics on the seed page
    HeuristicFallback,
}

/// Counts reported with a scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsStats {
    pub original_items: usize,
    pub after_deduplication: usize,
    pub final_items: usize,
    pub pages_analyzed: usize,
}

/// Result of a news scan
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsScan {
    pub news_items: Vec<ContentItem>,
    pub page_title: String,
    pub method: ScanMethod,
    pub pages_scanned: usize,
    pub stats: NewsStats,
}

/// Extracts news items from a website
#[derive(Clone)]
pub struct NewsScanner {
    fetcher: Fetcher,
    model: Option<SharedModel>,
    subpage_delay: Duration,
}

impl NewsScanner {
    pub fn new(fetcher: Fetcher, model: Option<SharedModel>) -> Self {
        Self {
            fetcher,
            model,
            subpage_delay: Duration::from_secs(1),
        }
    }

    /// Pause between subpage scans
    pub fn with_subpage_delay(mut self, delay: Duration) -> Self {
        self.subpage_delay = delay;
        self
    }

    /// Scan `url` for news items
    ///
    /// Fails if the seed page cannot be fetched or no items are found by
    /// any method.
    #[instrument(skip(self), fields(model = self.model.as_ref().map(|m| m.name())))]
    pub async fn scan(&self, url: &str) -> Result<NewsScan> {
        let seed = parse_http_url(url).ok_or_else(|| Error::invalid_request("Invalid URL format"))?;
        let seed_url = seed.to_string();
        let seed_html = self
            .fetcher
            .fetch_with_timeout(&seed_url, SEED_TIMEOUT)
            .await?;

        let (title, extra_pages) = discover_pages(&seed_html, &seed);
        let mut pages = vec![seed_url.clone()];
        pages.extend(extra_pages);
        info!("Scanning {} page(s) for news", pages.len());

        if let Some(model) = &self.model {
            match self
                .model_scan(model, &seed_url, &seed_html, &title, &pages)
                .await
            {
                Ok(scan) if !scan.news_items.is_empty() => return Ok(scan),
                Ok(_) => warn!("Model found no news items, using heuristics"),
                Err(e) => warn!("Model news extraction failed, using heuristics: {}", e),
            }
        }

        heuristic_scan(&seed_html, &seed_url, title)
    }

    async fn model_scan(
        &self,
        model: &SharedModel,
        seed: &str,
        seed_html: &str,
        title: &str,
        pages: &[String],
    ) -> std::result::Result<NewsScan, InferenceError> {
        let mut combined = seed_html.to_string();
        for page in pages.iter().skip(1).take(COMBINED_PAGES - 1) {
            match self.fetcher.fetch_with_timeout(page, SUBPAGE_TIMEOUT).await {
                Ok(html) => {
                    combined.push_str("\n\n<!-- additional page -->\n\n");
                    combined.push_str(&html);
                }
                Err(e) => warn!("Skipping {}: {}", page, e),
            }
        }

        let excerpt = prepare_excerpt(&combined, CHROME_SELECTORS, NEWS_EXCERPT_CHARS);
        debug!("News excerpt is {} chars", excerpt.len());

        let text = model
            .generate(NEWS_PREAMBLE, &news_prompt(seed, title, pages, &excerpt))
            .await?;
        let raw = parse_news_json(&text).unwrap_or_else(|| {
            warn!("News answer was not a JSON array, recovering from text");
            parse_news_lines(&text)
        });
        let mut items = normalize_items(raw, seed, FIRST_PASS);
        info!("First pass found {} items", items.len());

        if items.len() < TARGET_ITEMS {
            let excerpt = truncate_chars(&excerpt, SECOND_PASS_CHARS);
            match model
                .generate(SECOND_PASS_PREAMBLE, &second_pass_prompt(&excerpt))
                .await
            {
                Ok(text) => {
                    let raw = parse_news_json(&text).unwrap_or_default();
                    items.extend(normalize_items(raw, seed, SECOND_PASS));
                    info!("After second pass: {} items", items.len());
                }
                Err(e) => warn!("Second pass failed: {}", e),
            }
        }

        let original_items = items.len();
        if items.len() < TARGET_ITEMS && pages.len() > 1 {
            items.extend(self.scan_subpages(model, &pages[1..]).await);
        }

        Ok(finish(
            items,
            title.to_string(),
            ScanMethod::Model,
            pages.len(),
            original_items,
        ))
    }

    async fn scan_subpages(&self, model: &SharedModel, pages: &[String]) -> Vec<ContentItem> {
        let mut items = Vec::new();

        for (idx, page) in pages.iter().take(SUBPAGE_SCAN_LIMIT).enumerate() {
            if idx > 0 && !self.subpage_delay.is_zero() {
                tokio::time::sleep(self.subpage_delay).await;
            }

            let html = match self.fetcher.fetch_with_timeout(page, SUBPAGE_TIMEOUT).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("Skipping subpage {}: {}", page, e);
                    continue;
                }
            };

            let excerpt = prepare_excerpt(&html, CHROME_SELECTORS, SUBPAGE_CHARS);
            match model
                .generate(SUBPAGE_PREAMBLE, &subpage_prompt(page, &excerpt))
                .await
            {
                Ok(text) => {
                    let found = normalize_items(
                        parse_news_json(&text).unwrap_or_default(),
                        page,
                        SUBPAGE_PASS,
                    );
                    debug!("{} items from {}", found.len(), page);
                    items.extend(found);
                }
                Err(e) => warn!("Subpage scan of {} failed: {}", page, e),
            }
        }

        items
    }
}

/// Page title and same-origin news pages linked from the seed
fn discover_pages(html: &str, seed: &Url) -> (String, Vec<String>) {
    let document = scraper::Html::parse_document(html);
    let title = page_title(&document).unwrap_or_else(|| "News Website".to_string());

    let filter = LinkFilter::new(seed, &[]);
    let pages = select_links(html, seed, &filter, NEWS_LINK_PATTERNS)
        .into_iter()
        .filter(|url| url != seed)
        .take(MAX_EXTRA_PAGES)
        .map(String::from)
        .collect();

    (title, pages)
}

fn finish(
    items: Vec<ContentItem>,
    page_title: String,
    method: ScanMethod,
    pages: usize,
    original_items: usize,
) -> NewsScan {
    let mut unique = dedupe(items, DedupeKey::LinkAndTitle);
    let after_deduplication = unique.len();

    sort_by_importance(&mut unique);
    let mut news_items = truncate(unique, MAX_NEWS_ITEMS);
    for item in &mut news_items {
        item.confidence = item.importance;
    }

    let stats = NewsStats {
        original_items,
        after_deduplication,
        final_items: news_items.len(),
        pages_analyzed: pages,
    };
    NewsScan {
        news_items,
        page_title,
        method,
        pages_scanned: pages,
        stats,
    }
}

/// News items from the selector heuristics on the seed page alone
fn heuristic_scan(html: &str, seed: &str, page_title: String) -> Result<NewsScan> {
    let selectors = heuristic_selectors(html);
    let items = dedupe(
        extract_items(html, &selectors, seed, &ExtractOptions::default()),
        DedupeKey::Link,
    );
    if items.is_empty() {
        return Err(Error::NoItemsFound { pages: 1 });
    }

    let source = Url::parse(seed)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string));
    let items: Vec<ContentItem> = items
        .into_iter()
        .enumerate()
        .map(|(idx, mut item)| {
            item.category = Some(Category::General);
            item.importance = Some(Importance::Medium);
            item.rank = Some(idx as u32 + 1);
            item.timestamp = Some("recent".to_string());
            item.source = source.clone();
            item
        })
        .collect();

    let original_items = items.len();
    Ok(finish(
        items,
        page_title,
        ScanMethod::HeuristicFallback,
        1,
        original_items,
    ))
}
