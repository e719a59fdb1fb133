//! JSON envelope shared by every API endpoint
//!
//! Failures are reported in the body with HTTP 200 so clients only ever
//! branch on `success`.

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::warn;

use crate::Error;

/// Successful reply: `{"success": true, ...payload}`
#[derive(Debug, Serialize)]
pub struct Success<T> {
    success: bool,
    #[serde(flatten)]
    data: T,
}

impl<T> Success<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Failed reply: `{"success": false, "error": "..."}`
#[derive(Debug, Serialize)]
pub struct ApiError {
    success: bool,
    error: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.error
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        warn!("Request failed: {}", err);
        let message = match &err {
            Error::Fetch(e) => format!("Failed to fetch webpage: {e}"),
            _ => err.to_string(),
        };
        Self::new(message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

pub type ApiResult<T> = Result<Json<Success<T>>, ApiError>;

/// Wrap a payload as a successful reply
pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(Success::new(data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::FetchError;

    #[test]
    fn test_success_is_flattened() {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Payload {
            items_count: usize,
        }

        let value = serde_json::to_value(Success::new(Payload { items_count: 2 })).unwrap();
        assert_eq!(value, serde_json::json!({"success": true, "itemsCount": 2}));
    }

    #[test]
    fn test_fetch_errors_are_prefixed() {
        let err = ApiError::from(Error::Fetch(FetchError::HttpStatus { status: 503 }));
        assert_eq!(err.message(), "Failed to fetch webpage: Website returned HTTP 503");

        let err = ApiError::from(Error::invalid_request("URL is required"));
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value, serde_json::json!({"success": false, "error": "URL is required"}));
    }
}
