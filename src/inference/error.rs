//! Error types for selector and news inference

use thiserror::Error;

use crate::model::ModelError;

/// Reasons a model-backed strategy produced nothing usable
///
/// These are absorbed by the strategy chain, which moves on to the next
/// strategy; only the model test endpoint reports them to callers.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The model call itself failed
    #[error(transparent)]
    Provider(#[from] ModelError),

    /// The model answered with something that is not the expected JSON
    #[error("Failed to parse model response: {0}")]
    Parse(String),

    /// The answer parsed but broke the selector rules
    #[error("Invalid selectors: {0}")]
    Validation(String),

    /// No model is configured for this provider
    #[error("{0} is not configured")]
    Unavailable(String),
}
