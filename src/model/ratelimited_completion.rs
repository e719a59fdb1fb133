//! Client-side quota for outbound completion requests

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use rig::completion::{CompletionError, CompletionModel, CompletionRequest, CompletionResponse};
use tracing::{debug_span, info_span, Instrument};

/// Raw provider response carried through the limiter
pub struct RateLimitResponse<T> {
    #[allow(dead_code)]
    response: T,
}

/// Completion model that waits for a governor permit before each request
///
/// Clones share one limiter, so the quota holds across every request made
/// through the same provider handle.
#[derive(Clone)]
pub struct RateLimitedCompletionModel<M: CompletionModel> {
    model: M,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl<M> RateLimitedCompletionModel<M>
where
    M: CompletionModel,
{
    pub fn new(model: M, limiter: DefaultDirectRateLimiter) -> Self {
        Self {
            model,
            limiter: Arc::new(limiter),
        }
    }

    /// Allow at most `per_minute` requests per minute; zero is treated as one
    pub fn per_minute(model: M, per_minute: u32) -> Self {
        let quota = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
        Self::new(model, RateLimiter::direct(Quota::per_minute(quota)))
    }
}

impl<M: CompletionModel> CompletionModel for RateLimitedCompletionModel<M> {
    type Response = RateLimitResponse<M::Response>;

    async fn completion(
        &self,
        completion_request: CompletionRequest,
    ) -> Result<CompletionResponse<Self::Response>, CompletionError> {
        self.limiter
            .until_ready()
            .instrument(debug_span!("limiter"))
            .await;
        let response = self
            .model
            .completion(completion_request)
            .instrument(info_span!("completion"))
            .await?;

        Ok(CompletionResponse {
            choice: response.choice,
            raw_response: RateLimitResponse {
                response: response.raw_response,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MockCompletionModel;
    use rig::completion::AssistantContent;

    #[tokio::test]
    async fn test_passes_choice_through() {
        let mock = MockCompletionModel::new();
        mock.set_text_response("limited hello").await;
        let model = RateLimitedCompletionModel::per_minute(mock.clone(), 30);

        let response = model
            .completion_request("hi".to_string())
            .send()
            .await
            .unwrap();
        let text: Vec<String> = response
            .choice
            .iter()
            .filter_map(|c| match c {
                AssistantContent::Text(t) => Some(t.text.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(text, vec!["limited hello"]);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_quota_is_shared_between_clones() {
        let model = RateLimitedCompletionModel::per_minute(MockCompletionModel::new(), 1);
        let clone = model.clone();

        assert!(model.limiter.check().is_ok());
        assert!(clone.limiter.check().is_err());
    }
}
