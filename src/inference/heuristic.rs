//! Selector inference by counting common item patterns

use async_trait::async_trait;
use scraper::Html;
use tracing::{debug, instrument};

use crate::crawler::content_extraction::count_matches;
use crate::inference::{InferenceError, SelectorSet, SelectorStrategy, StrategyKind};

/// Item container patterns, in tie-break order
pub const ITEM_PATTERNS: &[&str] = &[
    "article",
    ".post",
    ".entry",
    ".item",
    ".card",
    ".product",
    ".listing",
    ".news-item",
    ".story",
    ".result",
    ".grid-item",
    ".list-item",
    ".content-item",
];

/// A pattern must match at least this many elements to count as repeating
pub const MIN_PATTERN_MATCHES: usize = 3;

const TITLE_UNION: &str = "h1, h2, h3, h4, .title, .headline, .name, a";
const LINK_UNION: &str = "a[href], [data-href]";
const DESCRIPTION_UNION: &str = "p, .excerpt, .summary, .description";

/// Match count per item pattern, for patterns that match anything
pub fn pattern_counts(document: &Html) -> Vec<(&'static str, usize)> {
    ITEM_PATTERNS
        .iter()
        .map(|pattern| (*pattern, count_matches(document, pattern)))
        .filter(|(_, count)| *count > 0)
        .collect()
}

/// Guess a selector set from the page's repeating structures
///
/// Every pattern matching at least [`MIN_PATTERN_MATCHES`] elements joins
/// the item union, most frequent first. With none, the broad fallback set
/// is returned.
pub fn heuristic_selectors(html: &str) -> SelectorSet {
    let document = Html::parse_document(html);

    let mut repeating: Vec<(&str, usize)> = pattern_counts(&document)
        .into_iter()
        .filter(|(_, count)| *count >= MIN_PATTERN_MATCHES)
        .collect();
    // stable: ties keep catalogue order
    repeating.sort_by(|a, b| b.1.cmp(&a.1));

    if repeating.is_empty() {
        debug!("No repeating pattern reached the threshold");
        return SelectorSet::fallback();
    }

    debug!("Repeating patterns: {:?}", repeating);
    SelectorSet {
        item: repeating
            .iter()
            .map(|(pattern, _)| *pattern)
            .collect::<Vec<_>>()
            .join(", "),
        title: TITLE_UNION.to_string(),
        link: LINK_UNION.to_string(),
        description: DESCRIPTION_UNION.to_string(),
    }
}

/// Strategy wrapper around [`heuristic_selectors`]
#[derive(Debug, Clone, Default)]
pub struct HeuristicStrategy;

#[async_trait]
impl SelectorStrategy for HeuristicStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Heuristic
    }

    #[instrument(skip(self, html))]
    async fn infer(&self, html: &str, _url: &str) -> Result<SelectorSet, InferenceError> {
        Ok(heuristic_selectors(html))
    }
}
