//! Request handlers
//!
//! Each handler validates its body, delegates to the pipeline or news
//! scanner, and wraps the outcome in the shared JSON envelope.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::diagnostics::SelectorReport;
use crate::extract::ContentItem;
use crate::inference::{InferenceError, SelectorSet};
use crate::model::SharedModel;
use crate::news::NewsScan;
use crate::pipeline::{
    Detection, ExtractRequest, Extraction, GeneratedFeed, Magazine, NewsFeed, PreviewImages,
    RenderedFeed, StructureReport,
};
use crate::server::response::{ok, ApiError, ApiResult};
use crate::server::AppState;
use crate::Error;

const TEST_PREAMBLE: &str = "You are a helpful assistant. Answer briefly.";
const TEST_PROMPT: &str = "Reply with one short sentence confirming you are working.";

fn required(value: Option<String>, message: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::new(message))
}

#[derive(Debug, Deserialize)]
pub struct UrlRequest {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewImagesRequest {
    pub items: Option<Vec<ContentItem>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlRequest {
    pub url: Option<String>,
    pub selectors: Option<SelectorSet>,
    pub max_pages: Option<usize>,
    pub recursive: Option<bool>,
    pub max_items: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateFeedRequest {
    pub url: Option<String>,
    pub selectors: Option<SelectorSet>,
    pub feed_title: Option<String>,
    pub max_items: Option<usize>,
    pub max_pages: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderFeedRequest {
    pub url: Option<String>,
    pub selected_items: Option<Vec<ContentItem>>,
    pub feed_title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderNewsFeedRequest {
    pub url: Option<String>,
    pub news_items: Option<Vec<ContentItem>>,
    pub feed_title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagazineRequest {
    pub news_items: Option<Vec<ContentItem>>,
    pub feed_title: Option<String>,
    pub layout: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TestModelRequest {
    pub provider: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TestModelResponse {
    pub message: String,
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[instrument(skip(state))]
pub async fn detect_selectors(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UrlRequest>,
) -> ApiResult<Detection> {
    let url = required(req.url, "URL is required")?;
    ok(state.pipeline.detect_selectors(&url).await?)
}

#[instrument(skip(state))]
pub async fn crawl_and_extract(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CrawlRequest>,
) -> ApiResult<Extraction> {
    let request = ExtractRequest {
        url: required(req.url, "URL is required")?,
        selectors: req.selectors,
        max_pages: req.max_pages,
        recursive: req.recursive,
        max_items: req.max_items,
    };
    ok(state.pipeline.crawl_and_extract(&request).await?)
}

#[instrument(skip(state))]
pub async fn generate_feed(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateFeedRequest>,
) -> ApiResult<GeneratedFeed> {
    let request = ExtractRequest {
        url: required(req.url, "URL is required")?,
        selectors: req.selectors,
        max_pages: req.max_pages,
        recursive: None,
        max_items: req.max_items,
    };
    ok(state
        .pipeline
        .generate_feed(&request, req.feed_title.as_deref())
        .await?)
}

#[instrument(skip(state, req))]
pub async fn render_feed(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RenderFeedRequest>,
) -> ApiResult<RenderedFeed> {
    let url = required(req.url, "URL is required")?;
    let items = req
        .selected_items
        .ok_or_else(|| ApiError::new("Selected items are required"))?;
    ok(state
        .pipeline
        .render_feed(&url, items, req.feed_title.as_deref())?)
}

#[instrument(skip(state))]
pub async fn news_scan(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UrlRequest>,
) -> ApiResult<NewsScan> {
    let url = required(req.url, "URL is required")?;
    ok(state.news.scan(&url).await?)
}

#[instrument(skip(state, req))]
pub async fn render_news_feed(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RenderNewsFeedRequest>,
) -> ApiResult<NewsFeed> {
    let url = required(req.url, "Invalid request data")?;
    let items = req
        .news_items
        .ok_or_else(|| ApiError::new("Invalid request data"))?;
    ok(state
        .pipeline
        .render_news_feed(&url, items, req.feed_title.as_deref())?)
}

#[instrument(skip(state, req))]
pub async fn render_magazine(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MagazineRequest>,
) -> ApiResult<Magazine> {
    let items = req.news_items.unwrap_or_default();
    ok(state
        .pipeline
        .render_magazine(items, req.feed_title.as_deref(), req.layout.as_deref())
        .await?)
}

#[instrument(skip(state, req))]
pub async fn preview_images(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PreviewImagesRequest>,
) -> ApiResult<PreviewImages> {
    let items = req
        .items
        .ok_or_else(|| ApiError::new("Items array is required"))?;
    ok(state.pipeline.preview_images(items).await)
}

#[instrument(skip(state))]
pub async fn debug_selectors(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UrlRequest>,
) -> ApiResult<SelectorReport> {
    let url = required(req.url, "URL is required")?;
    ok(state.pipeline.debug_selectors(&url).await?)
}

#[instrument(skip(state))]
pub async fn analyze_structure(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UrlRequest>,
) -> ApiResult<StructureReport> {
    let url = required(req.url, "URL is required")?;
    ok(state.pipeline.analyze_structure(&url).await?)
}

/// Send a trivial prompt to a configured model; the only endpoint that
/// reports model failures to the caller
#[instrument(skip(state))]
pub async fn test_model(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TestModelRequest>,
) -> ApiResult<TestModelResponse> {
    let provider = req.provider.unwrap_or_else(|| "grok".to_string());
    let model = select_model(&state, &provider)?;

    let response = model
        .generate(TEST_PREAMBLE, TEST_PROMPT)
        .await
        .map_err(|e| Error::from(InferenceError::from(e)))?;

    ok(TestModelResponse {
        message: format!("{} is working", model.name()),
        response,
    })
}

fn select_model(state: &AppState, provider: &str) -> Result<SharedModel, Error> {
    let (model, key) = match provider.to_ascii_lowercase().as_str() {
        "gemini" => (state.gemini.clone(), "GEMINI_API_KEY"),
        "grok" | "xai" => (state.grok.clone(), "XAI_API_KEY"),
        other => {
            return Err(Error::invalid_request(format!(
                "Unknown provider '{other}', expected gemini or grok"
            )))
        }
    };
    model.ok_or_else(|| InferenceError::Unavailable(key.to_string()).into())
}
