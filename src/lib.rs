//! # pagefeed - Turn any website into an RSS feed
//!
//! This crate crawls a website, works out which parts of its pages are
//! content items, and renders those items as an RSS 2.0 feed or a
//! magazine-style HTML page. Selector inference asks a hosted model first
//! (Gemini) and falls back to counting common item patterns, so feeds can be
//! generated with no API keys at all.
//!
//! ## Features
//!
//! - Bounded, same-origin breadth-first crawling with politeness delays
//! - Selector inference: Gemini, then heuristics, then static fallbacks
//! - Item extraction with link resolution, deduplication and ranking
//! - News scanning with Grok: categories, importance tiers, subpage passes
//! - RSS 2.0 rendering with quick-xml and a standalone magazine page
//! - Selector diagnostics for debugging a site
//! - An axum JSON API and a clap CLI
//!
//! ## Example
//!
//! ```rust,no_run
//! use pagefeed::crawler::{CrawlerConfig, Fetcher, FetcherConfig};
//! use pagefeed::inference::SelectorInference;
//! use pagefeed::pipeline::{ExtractRequest, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = Fetcher::new(FetcherConfig::default())?;
//!     let pipeline = Pipeline::new(
//!         fetcher,
//!         CrawlerConfig::builder().max_pages(10).build(),
//!         SelectorInference::with_model(None),
//!     );
//!
//!     let feed = pipeline
//!         .generate_feed(&ExtractRequest::new("https://example.com/blog"), None)
//!         .await?;
//!     println!("{}", feed.feed.xml);
//!     Ok(())
//! }
//! ```

mod error;
pub mod model;

pub mod config;
pub mod crawler;
pub mod diagnostics;
pub mod extract;
pub mod feed;
pub mod inference;
pub mod news;
pub mod pipeline;
pub mod rank;
pub mod server;

pub use error::{Error, Result};
