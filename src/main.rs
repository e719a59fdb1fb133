//! # pagefeed CLI
//!
//! Command-line entry point. `serve` runs the JSON API; the other
//! subcommands run a single pipeline step against a URL and print the result.
//!
//! - `serve`: start the HTTP API
//! - `detect`: infer content selectors for a page
//! - `extract`: crawl a site and list the extracted items
//! - `debug`: show element counts and selector samples for a page
//!
//! Configuration comes from the environment (and `.env`); see
//! [`pagefeed::config::AppConfig`].

mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use clap::{Args, CommandFactory, Parser, Subcommand};
use pagefeed::config::AppConfig;
use pagefeed::pipeline::ExtractRequest;
use pagefeed::server::{router, AppState};
use serde::Serialize;
use tracing::{info, instrument};

#[derive(Parser)]
#[command(author, version, about = "Turn any website into an RSS feed", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API server
    Serve(ServeArgs),

    /// Detect content selectors for a page
    Detect(UrlArgs),

    /// Crawl a website and extract its content items
    Extract(ExtractArgs),

    /// Show element counts and selector samples for a page
    Debug(UrlArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to bind (default: HOST or 0.0.0.0)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (default: PORT or 3000)
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct UrlArgs {
    /// Page URL
    #[arg(required = true)]
    url: String,

    /// Output format (text|json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Website URL to start from
    #[arg(required = true)]
    url: String,

    /// Maximum number of pages to crawl
    #[arg(short = 'p', long)]
    max_pages: Option<usize>,

    /// Follow links from every crawled page, not just the first
    #[arg(short, long)]
    recursive: bool,

    /// Maximum number of items to print
    #[arg(short = 'n', long)]
    max_items: Option<usize>,

    /// Output format (text|json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let _otel = telemetry::init_tracing_subscriber();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let state = AppState::from_config(&config).context("Failed to create HTTP client")?;

    match command {
        Commands::Serve(args) => serve_command(args, config, state).await?,
        Commands::Detect(args) => detect_command(args, &state).await?,
        Commands::Extract(args) => extract_command(args, &state).await?,
        Commands::Debug(args) => debug_command(args, &state).await?,
    }

    Ok(())
}

async fn serve_command(args: ServeArgs, config: AppConfig, state: AppState) -> anyhow::Result<()> {
    let host = args.host.unwrap_or(config.host);
    let port = args.port.unwrap_or(config.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(
        "Listening on {} (gemini: {}, grok: {})",
        addr,
        state.gemini.is_some(),
        state.grok.is_some()
    );

    axum::serve(listener, router(Arc::new(state)))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("Server error")?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[instrument(skip(state))]
async fn detect_command(args: UrlArgs, state: &AppState) -> anyhow::Result<()> {
    let detection = state.pipeline.detect_selectors(&args.url).await?;

    if args.format == "json" {
        return print_json(&detection);
    }

    println!("Suggested title: {}", detection.suggested_title);
    println!("Strategy:        {:?}", detection.strategy);
    println!("item:            {}", detection.selectors.item);
    println!("title:           {}", detection.selectors.title);
    println!("link:            {}", detection.selectors.link);
    println!("description:     {}", detection.selectors.description);
    Ok(())
}

#[instrument(skip(state))]
async fn extract_command(args: ExtractArgs, state: &AppState) -> anyhow::Result<()> {
    let request = ExtractRequest {
        url: args.url,
        selectors: None,
        max_pages: args.max_pages,
        recursive: args.recursive.then_some(true),
        max_items: args.max_items,
    };
    let extraction = state.pipeline.crawl_and_extract(&request).await?;

    if args.format == "json" {
        return print_json(&extraction);
    }

    for item in &extraction.items {
        println!("{}\n  {}", item.title, item.link);
        if !item.description.is_empty() {
            println!("  {}", item.description);
        }
    }
    println!(
        "\n{} items ({} found, {} duplicates) from {} pages using {:?} selectors",
        extraction.items.len(),
        extraction.stats.total_items,
        extraction.stats.duplicates_removed,
        extraction.pages_crawled,
        extraction.strategy
    );
    Ok(())
}

#[instrument(skip(state))]
async fn debug_command(args: UrlArgs, state: &AppState) -> anyhow::Result<()> {
    let report = state.pipeline.debug_selectors(&args.url).await?;

    if args.format == "json" {
        return print_json(&report);
    }

    let info = &report.debug_info;
    println!("Title:       {}", info.page_title);
    println!("Description: {}", info.meta_description);
    println!(
        "Elements:    {} total, {} links, {} images, {} articles, {} sections, {} divs",
        info.total_elements, info.links, info.images, info.articles, info.sections, info.divs
    );
    println!(
        "Headings:    h1={} h2={} h3={} h4={} h5={} h6={}",
        info.headings.h1,
        info.headings.h2,
        info.headings.h3,
        info.headings.h4,
        info.headings.h5,
        info.headings.h6
    );

    let groups = [
        ("Titles", &report.potential_selectors.titles),
        ("Links", &report.potential_selectors.links),
        ("Descriptions", &report.potential_selectors.descriptions),
        ("Categories", &report.potential_selectors.categories),
        ("Timestamps", &report.potential_selectors.timestamps),
    ];
    for (name, probes) in groups {
        println!("\n{name}:");
        for probe in probes {
            println!("  {:<20} {:>5}  {:?}", probe.selector, probe.count, probe.samples);
        }
    }

    let recommended = &report.recommended_selectors;
    println!("\nRecommended:");
    println!("  title:       {}", recommended.title);
    println!("  link:        {}", recommended.link);
    println!("  description: {}", recommended.description);
    println!("  category:    {}", recommended.category);
    println!("  timestamp:   {}", recommended.timestamp);
    Ok(())
}
