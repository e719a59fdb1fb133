//! Error types for the pagefeed crate

use thiserror::Error;

use crate::crawler::FetchError;
use crate::feed::FeedError;
use crate::inference::InferenceError;

/// Result type for pagefeed operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for pagefeed operations
#[derive(Debug, Error)]
pub enum Error {
    /// Fetching a page that the operation cannot continue without failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A model call failed where no fallback exists
    #[error("Model error: {0}")]
    Inference(#[from] InferenceError),

    /// Feed rendering failed
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    /// Missing or malformed request parameters
    #[error("{0}")]
    InvalidRequest(String),

    /// The selectors matched nothing usable on any crawled page
    #[error(
        "No content items found on {pages} crawled page(s). Try the AI-assisted detection or adjust the selectors manually."
    )]
    NoItemsFound {
        /// Number of pages that were searched
        pages: usize,
    },
}

impl Error {
    /// Convenience constructor for request validation failures
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_items_message_suggests_alternative() {
        let err = Error::NoItemsFound { pages: 3 };
        let message = err.to_string();
        assert!(message.contains("3 crawled page(s)"));
        assert!(message.contains("AI-assisted"));
    }

    #[test]
    fn test_invalid_request_is_bare_message() {
        let err = Error::invalid_request("URL is required");
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert_eq!(err.to_string(), "URL is required");
    }

    #[test]
    fn test_fetch_error_is_transparent() {
        let err: Error = FetchError::HttpStatus { status: 404 }.into();
        assert_eq!(err.to_string(), "Website returned HTTP 404");
    }
}
