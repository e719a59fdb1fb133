//! Model-guided selector inference

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::crawler::content_extraction::{prepare_excerpt, NOISE_SELECTORS};
use crate::inference::prompts::{selector_prompt, SELECTOR_PREAMBLE};
use crate::inference::response::parse_model_json;
use crate::inference::{InferenceError, SelectorSet, SelectorStrategy, StrategyKind};
use crate::model::SharedModel;

/// Characters of page HTML sent to the model
pub const SELECTOR_EXCERPT_CHARS: usize = 8000;

/// Asks a language model for a selector set
#[derive(Clone)]
pub struct ModelSelectorStrategy {
    model: SharedModel,
}

impl ModelSelectorStrategy {
    pub fn new(model: SharedModel) -> Self {
        Self { model }
    }
}

#[async_trait]
impl SelectorStrategy for ModelSelectorStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Model
    }

    #[instrument(skip(self, html), fields(model = self.model.name()))]
    async fn infer(&self, html: &str, url: &str) -> Result<SelectorSet, InferenceError> {
        let excerpt = prepare_excerpt(html, NOISE_SELECTORS, SELECTOR_EXCERPT_CHARS);
        debug!("Sending {} chars of HTML for selector inference", excerpt.len());

        let text = self
            .model
            .generate(SELECTOR_PREAMBLE, &selector_prompt(url, &excerpt))
            .await?;

        let selectors: SelectorSet = parse_model_json(&text, false)?;
        selectors.validate()?;
        Ok(selectors.trimmed())
    }
}
