use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use mockito::Server;
use pagefeed::crawler::{CrawlerConfig, Fetcher, FetcherConfig};
use pagefeed::inference::SelectorInference;
use pagefeed::model::{self, MockCompletionModel, SharedModel};
use pagefeed::news::NewsScanner;
use pagefeed::pipeline::Pipeline;
use pagefeed::server::{router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app(gemini: Option<SharedModel>, grok: Option<SharedModel>) -> Router {
    let fetcher = Fetcher::new(FetcherConfig::default()).unwrap();
    let pipeline = Pipeline::new(
        fetcher.clone(),
        CrawlerConfig::builder().delay_ms(0).build(),
        SelectorInference::with_model(gemini.clone()),
    );
    let news = NewsScanner::new(fetcher, grok.clone()).with_subpage_delay(Duration::ZERO);

    router(Arc::new(AppState {
        pipeline,
        news,
        gemini,
        grok,
    }))
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

const BLOG: &str = r#"<html><head><title>Test Blog</title></head><body>
    <div class="post"><h2>Hello world</h2><a href="/hello">Read</a><p>First post.</p></div>
    <div class="post"><h2>Second thoughts</h2><a href="/second">Read</a><p>Second post.</p></div>
    <div class="post"><h2>Third time</h2><a href="/third">Read</a><p>Third post.</p></div>
    </body></html>"#;

#[tokio::test]
async fn health_reports_version() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app(None, None).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["status"], "ok");
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn missing_url_is_reported_in_body() {
    let (status, body) = post_json(app(None, None), "/api/detect-selectors", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": false, "error": "URL is required"}));
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/detect-selectors")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app(None, None).oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn detect_selectors_with_model() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(BLOG)
        .create_async()
        .await;

    let mock = MockCompletionModel::new();
    mock.set_text_response(r#"{"item": ".post", "title": "h2", "link": "a", "description": "p"}"#)
        .await;

    let (_, body) = post_json(
        app(Some(model::mock(mock)), None),
        "/api/detect-selectors",
        json!({"url": server.url()}),
    )
    .await;

    assert_eq!(body["success"], true);
    assert_eq!(body["strategy"], "model");
    assert_eq!(body["suggestedTitle"], "Test Blog");
    assert_eq!(
        body["selectors"],
        json!({"item": ".post", "title": "h2", "link": "a", "description": "p"})
    );
}

#[tokio::test]
async fn crawl_and_extract_returns_items_and_stats() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(BLOG)
        .create_async()
        .await;

    let (_, body) = post_json(
        app(None, None),
        "/api/crawl-and-extract",
        json!({"url": server.url(), "maxPages": 1}),
    )
    .await;

    assert_eq!(body["success"], true);
    assert_eq!(body["pagesCrawled"], 1);
    assert_eq!(body["strategy"], "heuristic");
    assert_eq!(
        body["stats"],
        json!({"totalItems": 3, "uniqueItems": 3, "duplicatesRemoved": 0})
    );
    let items = body["items"].as_array().unwrap();
    assert_eq!(items[0]["title"], "Hello world");
    assert_eq!(items[0]["link"], format!("{}/hello", server.url()));
    assert_eq!(items[0]["sourcePage"], format!("{}/", server.url()));
    assert_eq!(items[0]["selected"], true);
    assert!(items[0].get("importance").is_none());
}

#[tokio::test]
async fn fetch_failures_are_reported_in_body() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/")
        .with_status(500)
        .create_async()
        .await;

    let (status, body) = post_json(
        app(None, None),
        "/api/generate-feed",
        json!({"url": server.url()}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().starts_with("Failed to fetch webpage"));
}

#[tokio::test]
async fn render_feed_filters_selection() {
    let items = json!([
        {"id": "1", "title": "Chosen one", "link": "https://example.com/1", "selected": true},
        {"id": "2", "title": "Left out", "link": "https://example.com/2", "selected": false}
    ]);

    let (_, body) = post_json(
        app(None, None),
        "/api/render-feed",
        json!({"url": "https://example.com/", "selectedItems": items, "feedTitle": "Picked"}),
    )
    .await;

    assert_eq!(body["success"], true);
    assert_eq!(body["preview"]["title"], "Picked");
    assert_eq!(body["preview"]["items"].as_array().unwrap().len(), 1);
    let xml = body["xml"].as_str().unwrap();
    assert!(xml.contains("Chosen one"));
    assert!(!xml.contains("Left out"));
    assert!(body["feedUrl"].as_str().unwrap().contains("/api/feed/"));
}

#[tokio::test]
async fn news_scan_uses_grok() {
    let mut server = Server::new_async().await;
    let page = r#"<html><head><title>Daily Planet</title></head><body><main>
        <h2><a href="/markets">Markets rally</a></h2><p>Stocks rose sharply today.</p>
        <h2><a href="/cup">Cup final tonight</a></h2><p>Two teams meet.</p>
        </main></body></html>"#;
    let _m = server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(page)
        .create_async()
        .await;

    let mock = MockCompletionModel::new();
    mock.set_text_response(
        r#"[
            {"title": "Markets rally", "link": "/markets", "description": "Stocks rose", "category": "finance", "importance": "high"},
            {"title": "Cup final tonight", "link": "/cup", "description": "Two teams meet", "category": "Sports", "importance": "low"}
        ]"#,
    )
    .await;

    let (_, body) = post_json(
        app(None, Some(model::mock(mock))),
        "/api/news-scan",
        json!({"url": server.url()}),
    )
    .await;

    assert_eq!(body["success"], true);
    assert_eq!(body["method"], "model");
    assert_eq!(body["pageTitle"], "Daily Planet");
    let items = body["newsItems"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["title"], "Markets rally");
    assert_eq!(items[0]["category"], "Business");
    assert_eq!(items[0]["importance"], "high");
    assert_eq!(items[0]["link"], format!("{}/markets", server.url()));
    assert_eq!(items[1]["category"], "Sports");
}

#[tokio::test]
async fn render_news_feed_reports_stats() {
    let items = json!([
        {"title": "Markets rally", "link": "https://news.example.com/m", "selected": true,
         "category": "Business", "importance": "high", "rank": 1, "source": "news.example.com"},
        {"title": "Quiet day", "link": "https://news.example.com/q", "selected": false,
         "category": "General", "importance": "low", "rank": 2, "source": "news.example.com"}
    ]);

    let (_, body) = post_json(
        app(None, None),
        "/api/render-news-feed",
        json!({"url": "https://news.example.com/", "newsItems": items}),
    )
    .await;

    assert_eq!(body["success"], true);
    assert_eq!(
        body["stats"],
        json!({"totalScanned": 2, "selected": 1, "categories": 1, "highImportance": 1})
    );
    let xml = body["xml"].as_str().unwrap();
    assert!(xml.contains("<news:importance>high</news:importance>"));
    assert!(xml.contains("<category>Business</category>"));
}

#[tokio::test]
async fn render_magazine_requires_items() {
    let (_, body) = post_json(app(None, None), "/api/render-magazine", json!({})).await;
    assert_eq!(body, json!({"success": false, "error": "News items are required"}));
}

#[tokio::test]
async fn analyze_structure_classifies_page() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(BLOG)
        .create_async()
        .await;

    let (_, body) = post_json(
        app(None, None),
        "/api/analyze-structure",
        json!({"url": server.url()}),
    )
    .await;

    assert_eq!(body["success"], true);
    assert_eq!(body["analysis"]["contentType"], "news");
    assert_eq!(body["analysis"]["layoutType"], "list");
    assert_eq!(body["pageTitle"], "Test Blog");
    assert_eq!(body["selectors"]["item"], ".post");
    assert_eq!(body["method"], "html-only");
}

#[tokio::test]
async fn test_model_without_key() {
    let (_, body) = post_json(app(None, None), "/api/test-model", json!({"provider": "grok"})).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("XAI_API_KEY"));
}

#[tokio::test]
async fn test_model_surfaces_provider_errors() {
    let failing = MockCompletionModel::new();
    failing.set_error("invalid api key").await;
    let (_, body) = post_json(
        app(Some(model::mock(failing)), None),
        "/api/test-model",
        json!({"provider": "gemini"}),
    )
    .await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("invalid api key"));

    let working = MockCompletionModel::new();
    working.set_text_response("I am working.").await;
    let (_, body) = post_json(
        app(None, Some(model::mock(working))),
        "/api/test-model",
        json!({"provider": "grok"}),
    )
    .await;
    assert_eq!(body["success"], true);
    assert_eq!(body["response"], "I am working.");
    assert_eq!(body["message"], "mock is working");
}

#[tokio::test]
async fn preview_images_finds_og_image() {
    let mut server = Server::new_async().await;
    let article = r#"<html><head><title>Story</title>
        <meta property="og:image" content="/cover.jpg"></head>
        <body><article><p>An article body that is long enough to count as a page.</p></article></body></html>"#;
    let _page = server
        .mock("GET", "/story")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(article)
        .create_async()
        .await;
    let _cover = server
        .mock("HEAD", "/cover.jpg")
        .with_status(200)
        .with_header("content-type", "image/jpeg")
        .create_async()
        .await;
    let _gone = server
        .mock("GET", "/gone")
        .with_status(404)
        .create_async()
        .await;

    let items = json!([
        {"title": "Found a cover", "link": format!("{}/story", server.url())},
        {"title": "Nothing there", "link": format!("{}/gone", server.url())}
    ]);
    let (_, body) = post_json(app(None, None), "/api/preview-images", json!({"items": items})).await;

    assert_eq!(body["success"], true);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["title"], "Found a cover");
    assert_eq!(items[0]["previewImage"], format!("{}/cover.jpg", server.url()));
    assert!(items[1]["previewImage"].is_null());
}

#[tokio::test]
async fn preview_images_requires_items() {
    let (_, body) = post_json(app(None, None), "/api/preview-images", json!({})).await;
    assert_eq!(body, json!({"success": false, "error": "Items array is required"}));
}
