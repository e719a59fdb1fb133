//! # Feed pipeline
//!
//! Ties the stages together: crawl from a seed URL, infer selectors once from
//! the seed page, extract items from every crawled page, dedupe and sort, then
//! render. The HTTP handlers and the CLI are thin wrappers over this type.

use chrono::Utc;
use scraper::Html;
use serde::Serialize;
use tracing::{info, instrument};
use url::Url;

use crate::crawler::content_extraction::{page_title, suggested_title};
use crate::crawler::{parse_http_url, CrawledPage, Crawler, CrawlerConfig, Fetcher};
use crate::diagnostics::{analyze_structure, debug_selectors, SelectorReport, StructureAnalysis};
use crate::extract::{extract_items, ContentItem, ExtractOptions, Importance};
use crate::feed::{
    article_images, feed_url, render_magazine, render_rss, with_article_images, FeedDocument,
    FeedPreview, DEFAULT_LAYOUT,
};
use crate::inference::{SelectorInference, SelectorSet, StrategyKind};
use crate::rank::{dedupe, sort_by_title, truncate, DedupeKey};
use crate::{Error, Result};

/// Base URL used for feed links when none is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Refresh interval advertised by news feeds, in minutes
const NEWS_FEED_TTL: u32 = 60;

/// Selectors chosen for a page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub selectors: SelectorSet,
    pub suggested_title: String,
    pub strategy: StrategyKind,
}

/// Parameters for a crawl-and-extract run
#[derive(Debug, Clone, Default)]
pub struct ExtractRequest {
    pub url: String,
    /// Used instead of inference when item, title and link are all set
    pub selectors: Option<SelectorSet>,
    pub max_pages: Option<usize>,
    pub recursive: Option<bool>,
    pub max_items: Option<usize>,
}

impl ExtractRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionStats {
    pub total_items: usize,
    pub unique_items: usize,
    pub duplicates_removed: usize,
}

/// Items extracted from a crawl
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub items: Vec<ContentItem>,
    pub selectors: SelectorSet,
    pub strategy: StrategyKind,
    pub suggested_title: String,
    pub pages_crawled: usize,
    pub stats: ExtractionStats,
}

/// RSS document plus the data shown next to it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedFeed {
    pub preview: FeedPreview,
    pub xml: String,
    pub feed_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFeed {
    #[serde(flatten)]
    pub feed: RenderedFeed,
    pub pages_crawled: usize,
    pub total_items_found: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsFeedStats {
    pub total_scanned: usize,
    pub selected: usize,
    pub categories: usize,
    pub high_importance: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsFeed {
    #[serde(flatten)]
    pub feed: RenderedFeed,
    pub stats: NewsFeedStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Magazine {
    pub magazine_html: String,
    pub items_count: usize,
    pub layout: String,
}

/// An item paired with the lead image found on its article page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewItem {
    #[serde(flatten)]
    pub item: ContentItem,
    pub preview_image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewImages {
    pub items: Vec<PreviewItem>,
}

/// Structure analysis together with selectors for the same page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureReport {
    pub analysis: StructureAnalysis,
    pub selectors: SelectorSet,
    pub page_title: String,
    pub method: String,
}

/// The website-to-feed pipeline
pub struct Pipeline {
    fetcher: Fetcher,
    crawl_defaults: CrawlerConfig,
    inference: SelectorInference,
    options: ExtractOptions,
    base_url: String,
}

impl Pipeline {
    pub fn new(fetcher: Fetcher, crawl_defaults: CrawlerConfig, inference: SelectorInference) -> Self {
        Self {
            fetcher,
            crawl_defaults,
            inference,
            options: ExtractOptions::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Base URL that announced feed URLs are built on
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_extract_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    async fn fetch_seed(&self, url: &str) -> Result<(Url, String)> {
        let seed = parse_http_url(url).ok_or_else(|| Error::invalid_request("A valid http(s) URL is required"))?;
        let html = self.fetcher.fetch(seed.as_str()).await?;
        Ok((seed, html))
    }

    /// Choose selectors for the page at `url`
    #[instrument(skip(self))]
    pub async fn detect_selectors(&self, url: &str) -> Result<Detection> {
        let (seed, html) = self.fetch_seed(url).await?;
        let inferred = self.inference.infer(&html, seed.as_str()).await;
        Ok(Detection {
            selectors: inferred.selectors,
            suggested_title: title_of(&html),
            strategy: inferred.strategy,
        })
    }

    /// Crawl from the request URL and extract items from every page
    #[instrument(skip(self, request), fields(url = %request.url))]
    pub async fn crawl_and_extract(&self, request: &ExtractRequest) -> Result<Extraction> {
        let seed = parse_http_url(&request.url)
            .ok_or_else(|| Error::invalid_request("A valid http(s) URL is required"))?;
        let provided = provided_selectors(request.selectors.as_ref())?;

        let mut config = self.crawl_defaults.clone();
        if let Some(max_pages) = request.max_pages {
            config.max_pages = max_pages.max(1);
        }
        if let Some(recursive) = request.recursive {
            config.recursive = recursive;
        }

        let crawler = Crawler::new(self.fetcher.clone(), config);
        let pages = crawler.crawl(seed.as_str()).await?;
        let seed_html = pages.first().map(|page| page.html.as_str()).unwrap_or_default();

        let (selectors, strategy) = match provided {
            Some(selectors) => (selectors, StrategyKind::Provided),
            None => {
                let inferred = self.inference.infer(seed_html, seed.as_str()).await;
                (inferred.selectors, inferred.strategy)
            }
        };
        let suggested_title = title_of(seed_html);

        let all_items = extract_pages(&pages, &selectors, &self.options);
        let total_items = all_items.len();
        let mut items = dedupe(all_items, DedupeKey::Link);
        let unique_items = items.len();
        sort_by_title(&mut items);
        if let Some(max_items) = request.max_items {
            items = truncate(items, max_items);
        }

        if items.is_empty() {
            return Err(Error::NoItemsFound { pages: pages.len() });
        }

        info!(
            "Extracted {} unique items from {} pages ({:?} selectors)",
            unique_items,
            pages.len(),
            strategy
        );

        Ok(Extraction {
            items,
            selectors,
            strategy,
            suggested_title,
            pages_crawled: pages.len(),
            stats: ExtractionStats {
                total_items,
                unique_items,
                duplicates_removed: total_items - unique_items,
            },
        })
    }

    /// Crawl, extract and render an RSS feed in one step
    pub async fn generate_feed(
        &self,
        request: &ExtractRequest,
        feed_title: Option<&str>,
    ) -> Result<GeneratedFeed> {
        let extraction = self.crawl_and_extract(request).await?;
        let title = non_empty(feed_title).unwrap_or(&extraction.suggested_title);
        let total_items_found = extraction.stats.total_items;
        let pages_crawled = extraction.pages_crawled;

        let doc = FeedDocument::new(
            title,
            request.url.as_str(),
            feed_url(&self.base_url),
            extraction.items,
        );
        Ok(GeneratedFeed {
            feed: rendered(doc)?,
            pages_crawled,
            total_items_found,
        })
    }

    /// Render a feed from items the user picked; unselected items are dropped
    pub fn render_feed(
        &self,
        url: &str,
        items: Vec<ContentItem>,
        feed_title: Option<&str>,
    ) -> Result<RenderedFeed> {
        let items: Vec<ContentItem> = items.into_iter().filter(|item| item.selected).collect();
        if items.is_empty() {
            return Err(Error::invalid_request("No items selected"));
        }

        let title = non_empty(feed_title).unwrap_or("Custom RSS Feed");
        let doc = FeedDocument::new(title, url, feed_url(&self.base_url), items);
        rendered(doc)
    }

    /// Render a news feed from scanned items; unselected items are dropped
    pub fn render_news_feed(
        &self,
        url: &str,
        items: Vec<ContentItem>,
        feed_title: Option<&str>,
    ) -> Result<NewsFeed> {
        let site = parse_http_url(url).ok_or_else(|| Error::invalid_request("Invalid request data"))?;
        let total_scanned = items.len();
        let mut selected: Vec<ContentItem> = items.into_iter().filter(|item| item.selected).collect();
        if selected.is_empty() {
            return Err(Error::invalid_request("No news items selected"));
        }

        for item in &mut selected {
            if item.description.is_empty() {
                let source = item.source.as_deref().unwrap_or_else(|| site.host_str().unwrap_or_default());
                item.description = format!("News story from {source}");
            }
        }

        let title = match non_empty(feed_title) {
            Some(title) => title.to_string(),
            None => format!("News Feed from {}", site.host_str().unwrap_or_default()),
        };
        let high_importance = selected
            .iter()
            .filter(|item| item.importance == Some(Importance::High))
            .count();

        let doc = FeedDocument::new(title, url, feed_url(&self.base_url), selected)
            .with_description(format!("Top news stories extracted from {url}"))
            .with_ttl(NEWS_FEED_TTL);
        let stats = NewsFeedStats {
            total_scanned,
            selected: doc.items.len(),
            categories: doc.categories.len(),
            high_importance,
        };

        Ok(NewsFeed {
            feed: rendered(doc)?,
            stats,
        })
    }

    /// Render selected news items as a magazine page, looking up article images
    pub async fn render_magazine(
        &self,
        items: Vec<ContentItem>,
        feed_title: Option<&str>,
        layout: Option<&str>,
    ) -> Result<Magazine> {
        if items.is_empty() {
            return Err(Error::invalid_request("News items are required"));
        }
        let selected: Vec<ContentItem> = items.into_iter().filter(|item| item.selected).collect();
        if selected.is_empty() {
            return Err(Error::invalid_request("No news items selected"));
        }

        let layout = non_empty(layout).unwrap_or(DEFAULT_LAYOUT).to_string();
        let title = non_empty(feed_title).unwrap_or("News Magazine");
        let selected = with_article_images(&self.fetcher, selected).await;

        Ok(Magazine {
            magazine_html: render_magazine(&selected, title, &layout, Utc::now()),
            items_count: selected.len(),
            layout,
        })
    }

    /// Look up a preview image for every item that does not carry one
    ///
    /// Items whose article page has no usable image get `None`.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn preview_images(&self, items: Vec<ContentItem>) -> PreviewImages {
        let images = article_images(&self.fetcher, &items, |item| item.image.is_none()).await;
        let items = items
            .into_iter()
            .zip(images)
            .map(|(item, preview_image)| PreviewItem { item, preview_image })
            .collect();
        PreviewImages { items }
    }

    /// Element counts and selector samples for the page at `url`
    #[instrument(skip(self))]
    pub async fn debug_selectors(&self, url: &str) -> Result<SelectorReport> {
        let (_, html) = self.fetch_seed(url).await?;
        Ok(debug_selectors(&html))
    }

    /// Classify the page at `url` and infer selectors for it
    #[instrument(skip(self))]
    pub async fn analyze_structure(&self, url: &str) -> Result<StructureReport> {
        let (seed, html) = self.fetch_seed(url).await?;
        let analysis = analyze_structure(&html);
        let inferred = self.inference.infer(&html, seed.as_str()).await;

        Ok(StructureReport {
            analysis,
            selectors: inferred.selectors,
            page_title: page_title_of(&html),
            method: "html-only".to_string(),
        })
    }
}

fn title_of(html: &str) -> String {
    suggested_title(&Html::parse_document(html))
}

fn page_title_of(html: &str) -> String {
    page_title(&Html::parse_document(html)).unwrap_or_else(|| "Unknown Page".to_string())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Caller-supplied selectors, if complete enough to skip inference
fn provided_selectors(selectors: Option<&SelectorSet>) -> Result<Option<SelectorSet>> {
    let Some(selectors) = selectors else {
        return Ok(None);
    };
    let complete = [&selectors.item, &selectors.title, &selectors.link]
        .iter()
        .all(|value| !value.trim().is_empty());
    if !complete {
        return Ok(None);
    }

    selectors
        .validate()
        .map_err(|e| Error::invalid_request(e.to_string()))?;
    Ok(Some(selectors.trimmed()))
}

fn extract_pages(
    pages: &[CrawledPage],
    selectors: &SelectorSet,
    options: &ExtractOptions,
) -> Vec<ContentItem> {
    pages
        .iter()
        .flat_map(|page| extract_items(&page.html, selectors, &page.url, options))
        .collect()
}

fn rendered(doc: FeedDocument) -> Result<RenderedFeed> {
    let xml = render_rss(&doc)?;
    Ok(RenderedFeed {
        preview: doc.preview(),
        xml,
        feed_url: doc.feed_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::FetcherConfig;
    use crate::news::Category;
    use mockito::Server;

    fn pipeline() -> Pipeline {
        let fetcher = Fetcher::new(FetcherConfig::default()).unwrap();
        let config = CrawlerConfig::builder().delay_ms(0).build();
        Pipeline::new(fetcher, config, SelectorInference::with_model(None))
    }

    const LISTING: &str = r#"<html><head><title>Example Blog</title></head><body>
        <div class="post"><h2>Zebra sightings</h2><a href="/zebra">Read</a></div>
        <div class="post"><h2>Apple harvest</h2><a href="/apple">Read</a></div>
        <div class="post"><h2>Mango season</h2><a href="/mango">Read</a></div>
        </body></html>"#;

    #[tokio::test]
    async fn test_detect_selectors_heuristic() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(LISTING)
            .create_async()
            .await;

        let detection = pipeline().detect_selectors(&server.url()).await.unwrap();
        assert_eq!(detection.strategy, StrategyKind::Heuristic);
        assert_eq!(detection.selectors.item, ".post");
        assert_eq!(detection.suggested_title, "Example Blog");
    }

    #[tokio::test]
    async fn test_crawl_and_extract_sorted_and_truncated() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(LISTING)
            .create_async()
            .await;

        let mut request = ExtractRequest::new(server.url());
        request.max_pages = Some(1);
        request.max_items = Some(2);
        let extraction = pipeline().crawl_and_extract(&request).await.unwrap();

        assert_eq!(extraction.pages_crawled, 1);
        assert_eq!(extraction.stats.total_items, 3);
        let titles: Vec<&str> = extraction.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Apple harvest", "Mango season"]);
    }

    #[tokio::test]
    async fn test_provided_selectors_are_validated() {
        let mut request = ExtractRequest::new("https://example.com/");
        request.selectors = Some(SelectorSet {
            item: "div[".to_string(),
            title: "h2".to_string(),
            link: "a".to_string(),
            description: String::new(),
        });

        let err = pipeline().crawl_and_extract(&request).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let err = pipeline()
            .crawl_and_extract(&ExtractRequest::new("not a url"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn test_render_feed_uses_selected_items() {
        let mut kept = ContentItem::new("1", "Kept item", "https://example.com/1", "", "https://example.com/");
        kept.selected = true;
        let mut dropped = ContentItem::new("2", "Dropped item", "https://example.com/2", "", "https://example.com/");
        dropped.selected = false;

        let feed = pipeline()
            .render_feed("https://example.com/", vec![kept, dropped.clone()], None)
            .unwrap();
        assert_eq!(feed.preview.title, "Custom RSS Feed");
        assert_eq!(feed.preview.items.len(), 1);
        assert!(feed.xml.contains("Kept item"));
        assert!(!feed.xml.contains("Dropped item"));
        assert!(feed.feed_url.starts_with("http://localhost:3000/api/feed/"));

        let err = pipeline()
            .render_feed("https://example.com/", vec![dropped], None)
            .unwrap_err();
        assert_eq!(err.to_string(), "No items selected");
    }

    #[test]
    fn test_render_news_feed_stats() {
        let mut items = Vec::new();
        for (n, (category, importance)) in [
            (Category::World, Importance::High),
            (Category::Sports, Importance::Low),
            (Category::World, Importance::High),
        ]
        .into_iter()
        .enumerate()
        {
            let mut item = ContentItem::new(
                n.to_string(),
                format!("Headline {n}"),
                format!("https://news.example.com/{n}"),
                "",
                "https://news.example.com/",
            );
            item.category = Some(category);
            item.importance = Some(importance);
            item.selected = n != 1;
            items.push(item);
        }

        let feed = pipeline()
            .render_news_feed("https://news.example.com/", items, None)
            .unwrap();
        assert_eq!(feed.feed.preview.title, "News Feed from news.example.com");
        assert_eq!(
            feed.stats,
            NewsFeedStats {
                total_scanned: 3,
                selected: 2,
                categories: 1,
                high_importance: 2,
            }
        );
        assert!(feed.feed.xml.contains("<ttl>60</ttl>"));
        assert!(feed.feed.xml.contains("News story from news.example.com"));
    }

    #[tokio::test]
    async fn test_preview_images_keep_existing_and_mark_missing() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/gone")
            .with_status(404)
            .create_async()
            .await;

        let mut kept = ContentItem::new("1", "Kept image", "https://example.com/1", "", "https://example.com/");
        kept.image = Some("https://example.com/kept.png".to_string());
        let missing = ContentItem::new(
            "2",
            "Missing page",
            format!("{}/gone", server.url()),
            "",
            "https://example.com/",
        );

        let preview = pipeline().preview_images(vec![kept, missing]).await;
        assert_eq!(preview.items.len(), 2);
        assert_eq!(
            preview.items[0].preview_image.as_deref(),
            Some("https://example.com/kept.png")
        );
        assert_eq!(preview.items[1].preview_image, None);

        let json = serde_json::to_value(&preview).unwrap();
        assert_eq!(json["items"][1]["title"], "Missing page");
        assert!(json["items"][1]["previewImage"].is_null());
    }

    #[tokio::test]
    async fn test_render_magazine_requires_selection() {
        let err = pipeline().render_magazine(Vec::new(), None, None).await.unwrap_err();
        assert_eq!(err.to_string(), "News items are required");

        let mut item = ContentItem::new("1", "Story", "https://example.com/1", "", "https://example.com/");
        item.selected = false;
        let err = pipeline()
            .render_magazine(vec![item], None, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No news items selected");
    }
}
