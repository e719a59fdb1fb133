//! # Selector Inference
//!
//! Decides which CSS selectors describe a page's content items. Strategies
//! are tried in order and the first valid answer wins:
//!
//! 1. `ModelSelectorStrategy`: asks a hosted model (when one is configured)
//! 2. `HeuristicStrategy`: counts a catalogue of common item patterns
//! 3. `SelectorSet::fallback()`: a broad static union
//!
//! Whatever the outcome, the selectors handed to extraction are non-empty and
//! parseable.

use async_trait::async_trait;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

mod error;
pub mod heuristic;
pub mod model;
pub mod prompts;
pub mod response;

pub use error::InferenceError;
pub use heuristic::{heuristic_selectors, HeuristicStrategy};
pub use model::ModelSelectorStrategy;

use crate::model::SharedModel;

const FALLBACK_ITEM: &str = "article, .post, .entry, .item, .card, .listing, .product, .shop, .company, .result, .content-item, .grid-item, .list-item, [class*='item'], [class*='card'], [class*='post'], [class*='entry']";
const FALLBACK_TITLE: &str = "h1, h2, h3, h4, .title, .headline, .name, .subject, a, .link-title, [class*='title'], [class*='name'], [class*='headline']";
const FALLBACK_LINK: &str = "a[href], .link, [href], .url, .read-more";
const FALLBACK_DESCRIPTION: &str = "p, .excerpt, .summary, .description, .content, .text, .body, .intro, [class*='desc'], [class*='summary'], [class*='excerpt']";

/// CSS selectors describing a page's content items
///
/// `title`, `link` and `description` are matched inside each `item` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSet {
    #[serde(default)]
    pub item: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub description: String,
}

impl SelectorSet {
    /// Broad static selectors used when nothing better is known
    pub fn fallback() -> Self {
        Self {
            item: FALLBACK_ITEM.to_string(),
            title: FALLBACK_TITLE.to_string(),
            link: FALLBACK_LINK.to_string(),
            description: FALLBACK_DESCRIPTION.to_string(),
        }
    }

    /// Check that item, title and link are non-empty and every selector parses
    pub fn validate(&self) -> Result<(), InferenceError> {
        for (field, value) in [
            ("item", &self.item),
            ("title", &self.title),
            ("link", &self.link),
        ] {
            if value.trim().is_empty() {
                return Err(InferenceError::Validation(format!(
                    "{field} selector is empty"
                )));
            }
            Self::check_parses(field, value)?;
        }

        if !self.description.trim().is_empty() {
            Self::check_parses("description", &self.description)?;
        }
        Ok(())
    }

    fn check_parses(field: &str, value: &str) -> Result<(), InferenceError> {
        Selector::parse(value.trim()).map(|_| ()).map_err(|e| {
            InferenceError::Validation(format!("{field} selector '{value}' does not parse: {e}"))
        })
    }

    /// Copy with surrounding whitespace removed from every selector
    pub fn trimmed(&self) -> Self {
        Self {
            item: self.item.trim().to_string(),
            title: self.title.trim().to_string(),
            link: self.link.trim().to_string(),
            description: self.description.trim().to_string(),
        }
    }
}

/// Which strategy produced a selector set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Hosted language model
    Model,
    /// Pattern counting
    Heuristic,
    /// Static last-resort selectors
    Fallback,
    /// Supplied by the caller
    Provided,
}

/// One way of inferring selectors from a page
#[async_trait]
pub trait SelectorStrategy: Send + Sync {
    /// Label reported alongside the result
    fn kind(&self) -> StrategyKind;

    /// Infer selectors for the page at `url` with the given HTML
    async fn infer(&self, html: &str, url: &str) -> Result<SelectorSet, InferenceError>;
}

/// Selectors together with the strategy that produced them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inferred {
    pub selectors: SelectorSet,
    pub strategy: StrategyKind,
}

/// Ordered strategy chain with a static last resort
pub struct SelectorInference {
    strategies: Vec<Box<dyn SelectorStrategy>>,
}

impl SelectorInference {
    /// Chain of the given strategies, tried in order
    pub fn new(strategies: Vec<Box<dyn SelectorStrategy>>) -> Self {
        Self { strategies }
    }

    /// Model first when one is available, then the heuristic
    pub fn with_model(model: Option<SharedModel>) -> Self {
        let mut strategies: Vec<Box<dyn SelectorStrategy>> = Vec::new();
        if let Some(model) = model {
            strategies.push(Box::new(ModelSelectorStrategy::new(model)));
        }
        strategies.push(Box::new(HeuristicStrategy));
        Self::new(strategies)
    }

    /// Run the chain; never fails
    #[instrument(skip(self, html))]
    pub async fn infer(&self, html: &str, url: &str) -> Inferred {
        for strategy in &self.strategies {
            let kind = strategy.kind();
            let outcome = strategy
                .infer(html, url)
                .await
                .and_then(|selectors| selectors.validate().map(|_| selectors.trimmed()));

            match outcome {
                Ok(selectors) => {
                    info!("Selectors inferred by {:?} strategy", kind);
                    return Inferred {
                        selectors,
                        strategy: kind,
                    };
                }
                Err(e) => warn!("{:?} strategy failed: {}", kind, e),
            }
        }

        Inferred {
            selectors: SelectorSet::fallback(),
            strategy: StrategyKind::Fallback,
        }
    }
}
