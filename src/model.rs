//! # LLM Client Module
//!
//! Hosted language models used for selector inference (Gemini) and news
//! extraction (Grok), each behind a client-side rate limiter.
//!
//! ## Key Components
//!
//! - `TextModel`: object-safe "preamble + prompt in, text out" interface
//! - `CompletionText`: adapts any rig `CompletionModel` to `TextModel`
//! - `RateLimitedCompletionModel`: adds a governor quota to any completion model
//! - `MockCompletionModel`: canned responses for tests

use std::sync::Arc;

use async_trait::async_trait;
use rig::completion::{AssistantContent, CompletionError, CompletionModel};
use rig::providers::{gemini, xai};
use thiserror::Error;
use tracing::{debug, instrument};

pub mod mock_model;
pub mod ratelimited_completion;

pub use mock_model::MockCompletionModel;
pub use ratelimited_completion::RateLimitedCompletionModel;

/// Default Gemini model for selector inference
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Default Grok model for news extraction
pub const DEFAULT_GROK_MODEL: &str = "grok-3";

/// Outbound requests per minute allowed for each provider
pub const REQUESTS_PER_MINUTE: u32 = 30;

/// Errors from a hosted model call
#[derive(Debug, Error)]
pub enum ModelError {
    /// The provider rejected or failed the request
    #[error("Provider error: {0}")]
    Completion(#[from] CompletionError),

    /// The provider answered without any text
    #[error("Model returned an empty response")]
    EmptyResponse,
}

/// A text-in, text-out language model
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Name of the model, for logs and diagnostics
    fn name(&self) -> &str;

    /// Run one completion with a system preamble and a user prompt
    async fn generate(&self, preamble: &str, prompt: &str) -> Result<String, ModelError>;
}

/// Shared handle to a text model
pub type SharedModel = Arc<dyn TextModel>;

/// Adapter from a rig completion model to [`TextModel`]
#[derive(Clone)]
pub struct CompletionText<M: CompletionModel> {
    name: String,
    model: M,
}

impl<M: CompletionModel> CompletionText<M> {
    pub fn new(name: impl Into<String>, model: M) -> Self {
        Self {
            name: name.into(),
            model,
        }
    }
}

#[async_trait]
impl<M> TextModel for CompletionText<M>
where
    M: CompletionModel + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, preamble, prompt), fields(model = %self.name, prompt_len = prompt.len()))]
    async fn generate(&self, preamble: &str, prompt: &str) -> Result<String, ModelError> {
        let response = self
            .model
            .completion_request(prompt.to_string())
            .preamble(preamble.to_string())
            .send()
            .await?;

        let text = response
            .choice
            .iter()
            .map(|c| match c {
                AssistantContent::Text(t) => t.text.clone(),
                _ => "".to_string(),
            })
            .collect::<Vec<String>>()
            .join("\n");

        if text.trim().is_empty() {
            return Err(ModelError::EmptyResponse);
        }

        debug!("Model returned {} chars", text.len());
        Ok(text)
    }
}

/// Rate-limited Gemini model
pub fn gemini(api_key: &str, model: &str) -> SharedModel {
    let client = gemini::Client::new(api_key);
    let completion =
        RateLimitedCompletionModel::per_minute(client.completion_model(model), REQUESTS_PER_MINUTE);
    Arc::new(CompletionText::new(model, completion))
}

/// Rate-limited Grok model
pub fn grok(api_key: &str, model: &str) -> SharedModel {
    let client = xai::Client::new(api_key);
    let completion =
        RateLimitedCompletionModel::per_minute(client.completion_model(model), REQUESTS_PER_MINUTE);
    Arc::new(CompletionText::new(model, completion))
}

/// Wrap a mock model for tests and offline runs
pub fn mock(model: MockCompletionModel) -> SharedModel {
    Arc::new(CompletionText::new("mock", model))
}
