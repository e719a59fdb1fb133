//! # Mock Completion Model for Testing
//!
//! Provides a `MockCompletionModel` that implements the `CompletionModel` trait.
//! It returns queued replies first, then a default reply or error, so tests can
//! script multi-pass conversations without making API calls.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rig::{
    completion::{
        AssistantContent, CompletionError, CompletionModel, CompletionRequest, CompletionResponse,
    },
    one_or_many::OneOrMany,
};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
enum Reply {
    Content(OneOrMany<AssistantContent>),
    Error(String),
}

/// A mock completion model for testing purposes.
#[derive(Debug, Clone, Default)]
pub struct MockCompletionModel {
    queued: Arc<Mutex<VecDeque<Reply>>>,
    default: Arc<Mutex<Option<Reply>>>,
    calls: Arc<AtomicUsize>,
}

impl MockCompletionModel {
    /// Creates a new mock model that answers with an empty text response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the response returned once the queue is empty.
    pub async fn set_response(&self, response: OneOrMany<AssistantContent>) {
        *self.default.lock().await = Some(Reply::Content(response));
    }

    /// Helper to set a simple text response.
    pub async fn set_text_response(&self, text: &str) {
        self.set_response(OneOrMany::one(AssistantContent::text(text)))
            .await;
    }

    /// Makes every unqueued call fail with a provider error.
    pub async fn set_error(&self, message: &str) {
        *self.default.lock().await = Some(Reply::Error(message.to_string()));
    }

    /// Queues a text response for the next call only.
    pub async fn push_text_response(&self, text: &str) {
        self.queued
            .lock()
            .await
            .push_back(Reply::Content(OneOrMany::one(AssistantContent::text(text))));
    }

    /// Number of completion calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompletionModel for MockCompletionModel {
    type Response = String;

    async fn completion(
        &self,
        _completion_request: CompletionRequest,
    ) -> Result<CompletionResponse<Self::Response>, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let queued = self.queued.lock().await.pop_front();
        let reply = match queued {
            Some(reply) => Some(reply),
            None => self.default.lock().await.clone(),
        };

        match reply {
            Some(Reply::Content(choice)) => Ok(CompletionResponse {
                choice,
                raw_response: "".to_string(),
            }),
            Some(Reply::Error(message)) => Err(CompletionError::ProviderError(message)),
            None => Ok(CompletionResponse {
                choice: OneOrMany::one(AssistantContent::text("")),
                raw_response: "".to_string(),
            }),
        }
    }
}
