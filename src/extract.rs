//! Item extraction: applies a selector set to a page's HTML

use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::crawler::content_extraction::{element_text, parse_selector, truncate_chars};
use crate::inference::SelectorSet;
use crate::news::Category;

/// News importance tier; orders `Low < Medium < High`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    #[serde(alias = "Low", alias = "LOW")]
    Low,
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "High", alias = "HIGH")]
    High,
}

impl Importance {
    /// Parse a loosely formatted tier name
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_selected() -> bool {
    true
}

/// One feed entry
///
/// The optional fields are only filled in for news items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source_page: String,
    #[serde(default = "default_selected")]
    pub selected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<Importance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Importance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ContentItem {
    /// Plain item with the news fields unset
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        link: impl Into<String>,
        description: impl Into<String>,
        source_page: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            link: link.into(),
            description: description.into(),
            source_page: source_page.into(),
            selected: true,
            category: None,
            importance: None,
            rank: None,
            timestamp: None,
            confidence: None,
            source: None,
            image: None,
        }
    }
}

/// Limits applied while extracting items
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Titles are cut to this many characters
    pub max_title_chars: usize,

    /// Descriptions are cut to this many characters
    pub max_description_chars: usize,

    /// Items need a title longer than this
    pub min_title_chars: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_title_chars: 200,
            max_description_chars: 300,
            min_title_chars: 3,
        }
    }
}

impl ExtractOptions {
    pub fn max_title_chars(mut self, max: usize) -> Self {
        self.max_title_chars = max;
        self
    }

    pub fn max_description_chars(mut self, max: usize) -> Self {
        self.max_description_chars = max;
        self
    }

    pub fn min_title_chars(mut self, min: usize) -> Self {
        self.min_title_chars = min;
        self
    }
}

/// Resolve `href` against the page it was found on
///
/// Returns `None` unless the result is an absolute http(s) URL.
pub fn resolve_link(href: &str, page: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    page.join(href)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(String::from)
}

/// Extract content items from one page
///
/// Items come back in document order. Containers without a usable title or
/// link are dropped.
#[instrument(skip(html, selectors, options), fields(item = %selectors.item))]
pub fn extract_items(
    html: &str,
    selectors: &SelectorSet,
    source_page: &str,
    options: &ExtractOptions,
) -> Vec<ContentItem> {
    let Ok(page_url) = Url::parse(source_page) else {
        debug!("Source page is not a URL: {}", source_page);
        return Vec::new();
    };

    let (Some(item_sel), Some(title_sel), Some(link_sel)) = (
        parse_selector(&selectors.item),
        parse_selector(&selectors.title),
        parse_selector(&selectors.link),
    ) else {
        return Vec::new();
    };
    let description_sel = if selectors.description.trim().is_empty() {
        None
    } else {
        parse_selector(&selectors.description)
    };

    let document = Html::parse_document(html);
    let mut items = Vec::new();

    for (idx, container) in document.select(&item_sel).enumerate() {
        let n = idx + 1;

        let title_el = container.select(&title_sel).next();
        let title = title_el
            .map(|el| element_text(&el))
            .filter(|text| !text.is_empty())
            .or_else(|| title_el.and_then(|el| attr_text(&el, &["title", "alt"])))
            .or_else(|| attr_text(&container, &["title"]))
            .unwrap_or_else(|| format!("Item from {} #{}", page_url.path(), n));
        let title = truncate_chars(&title, options.max_title_chars);

        let href = container
            .select(&link_sel)
            .next()
            .and_then(|el| attr_text(&el, &["href", "data-href"]))
            .or_else(|| attr_text(&container, &["href"]));
        let Some(link) = href.and_then(|href| resolve_link(&href, &page_url)) else {
            continue;
        };

        if title.chars().count() <= options.min_title_chars {
            continue;
        }

        let description = description_sel
            .as_ref()
            .and_then(|sel| container.select(sel).next())
            .map(|el| truncate_chars(&element_text(&el), options.max_description_chars))
            .unwrap_or_default();

        items.push(ContentItem::new(
            format!("{}#{}", source_page, n),
            title,
            link,
            description,
            source_page,
        ));
    }

    debug!("Extracted {} items from {}", items.len(), source_page);
    items
}

fn attr_text(element: &ElementRef<'_>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| element.value().attr(name))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}
