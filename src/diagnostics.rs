//! Page diagnostics used to debug selector choices
//!
//! Both reports are computed from HTML alone: `debug_selectors` counts
//! elements and samples common selector candidates, `analyze_structure`
//! guesses what kind of site a page belongs to.

use scraper::{ElementRef, Html};
use serde::Serialize;
use tracing::instrument;

use crate::crawler::content_extraction::{
    count_matches, element_text, meta_description, page_title, parse_selector, truncate_chars,
};

const SAMPLES_PER_PROBE: usize = 3;

const TITLE_PROBES: &[&str] = &[
    "h1",
    "h2",
    "h3",
    ".title",
    ".headline",
    ".entry-title",
    ".post-title",
    ".article-title",
];
const LINK_PROBES: &[&str] = &["a[href]", ".read-more", ".permalink", ".entry-link"];
const DESCRIPTION_PROBES: &[&str] = &[
    ".excerpt",
    ".summary",
    ".description",
    ".content",
    "p",
    ".entry-content",
    ".post-content",
];
const CATEGORY_PROBES: &[&str] = &[".category", ".tag", ".label", ".topic", ".section"];
const TIMESTAMP_PROBES: &[&str] = &[
    ".date",
    ".time",
    "time",
    ".published",
    ".timestamp",
    ".post-date",
];

/// Areas that never hold feed content
const EXCLUDE_AREAS: &[&str] = &["navigation", "sidebar", "footer", "ads"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeadingCounts {
    pub h1: usize,
    pub h2: usize,
    pub h3: usize,
    pub h4: usize,
    pub h5: usize,
    pub h6: usize,
}

/// Page-level element counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    pub page_title: String,
    pub meta_description: String,
    pub total_elements: usize,
    pub headings: HeadingCounts,
    pub links: usize,
    pub images: usize,
    pub articles: usize,
    pub sections: usize,
    pub divs: usize,
}

/// One candidate selector with a few sample values
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorProbe {
    pub selector: String,
    pub count: usize,
    pub samples: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PotentialSelectors {
    pub titles: Vec<SelectorProbe>,
    pub links: Vec<SelectorProbe>,
    pub descriptions: Vec<SelectorProbe>,
    pub categories: Vec<SelectorProbe>,
    pub timestamps: Vec<SelectorProbe>,
}

/// First matching probe of each group, or a generic default
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendedSelectors {
    pub title: String,
    pub link: String,
    pub description: String,
    pub category: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorReport {
    pub debug_info: DebugInfo,
    pub potential_selectors: PotentialSelectors,
    pub recommended_selectors: RecommendedSelectors,
}

/// How a probe turns a matched element into a sample
#[derive(Clone, Copy)]
enum Sample {
    Text(usize),
    Href,
    TextOrDatetime,
}

impl Sample {
    fn take(self, element: &ElementRef<'_>) -> Option<String> {
        match self {
            Sample::Text(max) => Some(truncate_chars(&element_text(element), max)),
            Sample::Href => element.value().attr("href").map(str::to_string),
            Sample::TextOrDatetime => {
                let text = element_text(element);
                if text.is_empty() {
                    element.value().attr("datetime").map(str::to_string)
                } else {
                    Some(text)
                }
            }
        }
    }
}

fn probe(document: &Html, selectors: &[&str], sample: Sample) -> Vec<SelectorProbe> {
    selectors
        .iter()
        .filter_map(|raw| {
            let selector = parse_selector(raw)?;
            let matches: Vec<ElementRef<'_>> = document.select(&selector).collect();
            if matches.is_empty() {
                return None;
            }
            Some(SelectorProbe {
                selector: raw.to_string(),
                count: matches.len(),
                samples: matches
                    .iter()
                    .take(SAMPLES_PER_PROBE)
                    .filter_map(|element| sample.take(element))
                    .collect(),
            })
        })
        .collect()
}

fn first_or(probes: &[SelectorProbe], default: &str) -> String {
    probes
        .first()
        .map(|probe| probe.selector.clone())
        .unwrap_or_else(|| default.to_string())
}

/// Count page elements and sample common selector candidates
#[instrument(skip(html), fields(len = html.len()))]
pub fn debug_selectors(html: &str) -> SelectorReport {
    let document = Html::parse_document(html);

    let debug_info = DebugInfo {
        page_title: page_title(&document).unwrap_or_default(),
        meta_description: meta_description(&document).unwrap_or_default(),
        total_elements: count_matches(&document, "*"),
        headings: HeadingCounts {
            h1: count_matches(&document, "h1"),
            h2: count_matches(&document, "h2"),
            h3: count_matches(&document, "h3"),
            h4: count_matches(&document, "h4"),
            h5: count_matches(&document, "h5"),
            h6: count_matches(&document, "h6"),
        },
        links: count_matches(&document, "a[href]"),
        images: count_matches(&document, "img"),
        articles: count_matches(&document, "article"),
        sections: count_matches(&document, "section"),
        divs: count_matches(&document, "div"),
    };

    let potential = PotentialSelectors {
        titles: probe(&document, TITLE_PROBES, Sample::Text(100)),
        links: probe(&document, LINK_PROBES, Sample::Href),
        descriptions: probe(&document, DESCRIPTION_PROBES, Sample::Text(150)),
        categories: probe(&document, CATEGORY_PROBES, Sample::Text(100)),
        timestamps: probe(&document, TIMESTAMP_PROBES, Sample::TextOrDatetime),
    };

    let recommended = RecommendedSelectors {
        title: first_or(&potential.titles, "h1, h2"),
        link: first_or(&potential.links, "a[href]"),
        description: first_or(&potential.descriptions, ".excerpt, p"),
        category: first_or(&potential.categories, ".category"),
        timestamp: first_or(&potential.timestamps, ".date, time"),
    };

    SelectorReport {
        debug_info,
        potential_selectors: potential,
        recommended_selectors: recommended,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Blog,
    Ecommerce,
    News,
    Mixed,
    Unknown,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Blog => "blog",
            ContentType::Ecommerce => "ecommerce",
            ContentType::News => "news",
            ContentType::Mixed => "mixed",
            ContentType::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutType {
    List,
    Grid,
    Cards,
    Mixed,
}

/// Coarse description of what a page contains
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureAnalysis {
    pub content_type: ContentType,
    pub layout_type: LayoutType,
    pub item_count: usize,
    pub recommended_focus: String,
    pub exclude_areas: Vec<String>,
    pub confidence: String,
    pub method: String,
}

/// Classify a page from its markup
///
/// `<article>` elements win over product markup, which wins over post
/// markup, which wins over generic cards.
pub fn analyze_structure(html: &str) -> StructureAnalysis {
    let document = Html::parse_document(html);
    let articles = count_matches(&document, "article");
    let products = count_matches(&document, ".product, .item");
    let posts = count_matches(&document, ".post, .entry");
    let cards = count_matches(&document, ".card");

    let (content_type, layout_type) = if articles > 0 {
        (ContentType::Blog, LayoutType::List)
    } else if products > 0 {
        (ContentType::Ecommerce, LayoutType::Grid)
    } else if posts > 0 {
        (ContentType::News, LayoutType::List)
    } else if cards > 0 {
        (ContentType::Mixed, LayoutType::Cards)
    } else {
        (ContentType::Unknown, LayoutType::Mixed)
    };

    StructureAnalysis {
        content_type,
        layout_type,
        item_count: articles + products + posts + cards,
        recommended_focus: format!("Focus on {} content extraction", content_type.as_str()),
        exclude_areas: EXCLUDE_AREAS.iter().map(|area| area.to_string()).collect(),
        confidence: "medium".to_string(),
        method: "html-structure-analysis".to_string(),
    }
}
