//! # HTTP API
//!
//! An axum router exposing the pipeline as POST JSON endpoints under `/api`
//! plus a `GET /health` probe. All endpoints answer 200 with a `success`
//! flag; only malformed JSON bodies are rejected by axum itself.

use std::sync::Arc;

use axum::http::{header::CONTENT_TYPE, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::crawler::{Fetcher, FetcherConfig};
use crate::inference::SelectorInference;
use crate::model::SharedModel;
use crate::news::NewsScanner;
use crate::pipeline::Pipeline;

pub mod response;
pub mod routes;

/// Shared, read-only state behind every handler
pub struct AppState {
    pub pipeline: Pipeline,
    pub news: NewsScanner,
    pub gemini: Option<SharedModel>,
    pub grok: Option<SharedModel>,
}

impl AppState {
    /// Wire up clients from configuration
    pub fn from_config(config: &AppConfig) -> reqwest::Result<Self> {
        let fetcher = Fetcher::new(FetcherConfig::default())?;
        let gemini = config.gemini();
        let grok = config.grok();

        let pipeline = Pipeline::new(
            fetcher.clone(),
            config.crawler_config(),
            SelectorInference::with_model(gemini.clone()),
        )
        .with_base_url(config.base_url.clone());
        let news = NewsScanner::new(fetcher, grok.clone());

        Ok(Self {
            pipeline,
            news,
            gemini,
            grok,
        })
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/api/detect-selectors", post(routes::detect_selectors))
        .route("/api/crawl-and-extract", post(routes::crawl_and_extract))
        .route("/api/generate-feed", post(routes::generate_feed))
        .route("/api/render-feed", post(routes::render_feed))
        .route("/api/news-scan", post(routes::news_scan))
        .route("/api/render-news-feed", post(routes::render_news_feed))
        .route("/api/render-magazine", post(routes::render_magazine))
        .route("/api/preview-images", post(routes::preview_images))
        .route("/api/debug-selectors", post(routes::debug_selectors))
        .route("/api/analyze-structure", post(routes::analyze_structure))
        .route("/api/test-model", post(routes::test_model))
        .route("/health", get(routes::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
