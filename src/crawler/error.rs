//! Error types for the crawler module

use thiserror::Error;

/// Error type for page fetches
///
/// Every variant is reported separately so callers can tell a dead host from a
/// page that simply is not HTML. During a crawl any of these skips the page;
/// on the seed URL they abort the session.
#[derive(Debug, Error)]
pub enum FetchError {
    /// DNS, connection, TLS or body read failure
    #[error("Failed to reach {url}: {message}")]
    Network {
        /// The URL being fetched
        url: String,
        /// Underlying client error
        message: String,
    },

    /// The per-request timeout elapsed
    #[error("Request to {url} timed out. The website may be slow or unreachable.")]
    Timeout {
        /// The URL being fetched
        url: String,
    },

    /// Non-2xx response
    #[error("Website returned HTTP {status}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
    },

    /// Response was not an HTML document
    #[error("URL does not point to an HTML page (content-type: {content_type})")]
    ContentType {
        /// The content-type header that was received, or empty
        content_type: String,
    },

    /// Body shorter than the minimum plausible page length
    #[error("Received empty or very short response from website ({len} bytes)")]
    EmptyBody {
        /// Body length in bytes
        len: usize,
    },

    /// The URL could not be parsed
    #[error("Invalid URL format: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl FetchError {
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Network {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}
