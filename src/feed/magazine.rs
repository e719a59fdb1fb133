//! Magazine-style HTML page for a set of news items

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use quick_xml::escape::escape;
use scraper::Html;
use std::fmt::Write;
use tracing::{debug, instrument};
use url::Url;

use crate::crawler::content_extraction::parse_selector;
use crate::crawler::{Fetcher, IMAGE_PAGE_TIMEOUT};
use crate::extract::{resolve_link, ContentItem, Importance};
use crate::news::Category;

/// Layout used when the request does not name one
pub const DEFAULT_LAYOUT: &str = "cosmic-universe";

/// Article pages fetched at once while looking up images
pub const IMAGE_LOOKUP_CONCURRENCY: usize = 6;

/// Places an article image is looked for, best first
const IMAGE_SELECTORS: &[(&str, &str)] = &[
    (r#"meta[property="og:image"]"#, "content"),
    (r#"meta[name="twitter:image"]"#, "content"),
    (r#"img[src*="featured"]"#, "src"),
    (r#"img[src*="hero"]"#, "src"),
    (r#"img[src*="main"]"#, "src"),
    (".featured-image img", "src"),
    (".hero-image img", "src"),
    (".article-image img", "src"),
    ("article img", "src"),
    (".content img", "src"),
    ("img[alt]", "src"),
];

const STYLE: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body {
    font-family: 'Inter', -apple-system, BlinkMacSystemFont, sans-serif;
    background: #000;
    background-image:
        radial-gradient(circle at 20% 30%, rgba(168, 85, 247, 0.15) 0%, transparent 50%),
        radial-gradient(circle at 80% 70%, rgba(6, 182, 212, 0.12) 0%, transparent 50%),
        radial-gradient(circle at 50% 50%, rgba(236, 72, 153, 0.08) 0%, transparent 60%);
    color: #fff;
    min-height: 100vh;
}
.magazine-container { max-width: 1400px; margin: 0 auto; padding: 3rem 2rem; }
.magazine-header { text-align: center; margin-bottom: 4rem; }
.magazine-title {
    font-size: 3.5rem;
    font-weight: 800;
    background: linear-gradient(135deg, #a855f7 0%, #06b6d4 50%, #ec4899 100%);
    -webkit-background-clip: text;
    -webkit-text-fill-color: transparent;
    background-clip: text;
}
.magazine-subtitle { opacity: 0.8; font-weight: 300; letter-spacing: 3px; color: #a855f7; }
.magazine-date { font-size: 0.9rem; opacity: 0.6; margin-top: 0.5rem; color: #06b6d4; }
.cards-container {
    display: grid;
    grid-template-columns: repeat(auto-fit, minmax(350px, 1fr));
    gap: 2rem;
    justify-items: center;
}
.news-card {
    width: 350px;
    min-height: 500px;
    background: linear-gradient(145deg, rgba(0, 0, 0, 0.9) 0%, rgba(15, 15, 35, 0.8) 50%, rgba(26, 0, 51, 0.9) 100%);
    border-radius: 20px;
    border: 1px solid rgba(168, 85, 247, 0.2);
    box-shadow: 0 0 40px var(--cosmic-color);
    position: relative;
    overflow: hidden;
    transition: transform 0.4s ease, box-shadow 0.4s ease;
}
.news-card:hover { transform: translateY(-20px) scale(1.03); box-shadow: 0 0 80px var(--cosmic-color); }
.news-card.main-card {
    width: 100%;
    max-width: 900px;
    grid-column: 1 / -1;
    border: 2px solid rgba(168, 85, 247, 0.4);
}
.card-content { padding: 2rem; display: flex; flex-direction: column; height: 100%; }
.card-image {
    width: 100%;
    height: 200px;
    object-fit: cover;
    border-radius: 15px;
    margin-bottom: 1.5rem;
    border: 1px solid rgba(168, 85, 247, 0.2);
}
.main-card .card-image { height: 300px; }
.card-meta { display: flex; justify-content: space-between; align-items: center; margin-bottom: 1rem; }
.card-category {
    padding: 0.6rem 1.2rem;
    border-radius: 25px;
    font-size: 0.75rem;
    font-weight: 700;
    text-transform: uppercase;
    letter-spacing: 1px;
    background: linear-gradient(45deg, var(--accent-color), rgba(168, 85, 247, 0.8));
}
.card-importance { font-size: 0.7rem; text-transform: uppercase; letter-spacing: 2px; opacity: 0.7; }
.importance-high { color: #ef4444; }
.importance-medium { color: #f59e0b; }
.importance-low { color: #10b981; }
.card-title { font-size: 1.3rem; line-height: 1.4; margin-bottom: 1rem; }
.main-card .card-title { font-size: 2rem; }
.card-description { font-size: 0.95rem; line-height: 1.6; opacity: 0.8; margin-bottom: 1.5rem; flex-grow: 1; }
.card-footer { display: flex; justify-content: space-between; align-items: center; font-size: 0.8rem; opacity: 0.7; }
.card-link { color: var(--accent-color); text-decoration: none; font-weight: 600; }
.magazine-footer { text-align: center; margin-top: 4rem; color: rgba(255, 255, 255, 0.5); font-size: 0.9rem; }
"#;

/// Render a standalone magazine page
///
/// Only selected items are shown; the first one becomes the lead story.
#[instrument(skip(items), fields(items = items.len()))]
pub fn render_magazine(
    items: &[ContentItem],
    title: &str,
    layout: &str,
    generated_at: DateTime<Utc>,
) -> String {
    let selected: Vec<&ContentItem> = items.iter().filter(|item| item.selected).collect();
    let title = escape(title);

    let mut cards = String::new();
    for (idx, item) in selected.iter().enumerate() {
        render_card(&mut cards, item, idx == 0);
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{STYLE}</style>
</head>
<body class="layout-{layout}">
    <div class="magazine-container">
        <header class="magazine-header">
            <h1 class="magazine-title">{title}</h1>
            <p class="magazine-subtitle">NEWS MAGAZINE</p>
            <p class="magazine-date">{date}</p>
        </header>
        <main class="cards-container">
{cards}        </main>
        <footer class="magazine-footer">
            <p>Generated {generated} &#183; {count} articles</p>
        </footer>
    </div>
</body>
</html>
"#,
        layout = escape(layout),
        date = generated_at.format("%A, %B %-d, %Y"),
        generated = generated_at.format("%Y-%m-%d %H:%M UTC"),
        count = selected.len(),
    )
}

fn render_card(out: &mut String, item: &ContentItem, lead: bool) {
    let category = item.category.unwrap_or(Category::General);
    let importance = item.importance.unwrap_or(Importance::Medium);
    let accent = category.accent();
    let source = item.source.as_deref().unwrap_or_default();
    let description = if item.description.is_empty() && lead {
        format!("Featured news article from {source}")
    } else {
        item.description.clone()
    };

    let image = match item.image.as_deref().and_then(http_url) {
        Some(src) => format!(
            r#"<img src="{}" alt="{}" class="card-image" loading="lazy" />"#,
            escape(src),
            escape(item.title.as_str())
        ),
        None => placeholder_svg(category),
    };

    let heading = if lead { "h2" } else { "h3" };
    let _ = write!(
        out,
        r#"            <article class="news-card{lead_class}" style="--cosmic-color: {glow}; --accent-color: {accent};">
                <div class="card-content">
                    {image}
                    <div class="card-meta">
                        <span class="card-category">{category}</span>
                        <span class="card-importance importance-{importance}">{importance}</span>
                    </div>
                    <{heading} class="card-title">{title}</{heading}>
                    <p class="card-description">{description}</p>
                    <div class="card-footer">
                        <span class="card-source">{source}</span>
                        <span class="card-timestamp">{timestamp}</span>
                        <a class="card-link" href="{link}" target="_blank" rel="noopener">Read more</a>
                    </div>
                </div>
            </article>
"#,
        lead_class = if lead { " main-card" } else { "" },
        glow = category.glow(importance),
        title = escape(item.title.as_str()),
        description = escape(description.as_str()),
        source = escape(source),
        timestamp = escape(item.timestamp.as_deref().unwrap_or("recent")),
        link = escape(http_url(&item.link).unwrap_or("#")),
    );
}

/// Only absolute http(s) URLs are written into `href` and `src`
fn http_url(value: &str) -> Option<&str> {
    Url::parse(value)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(|_| value)
}

/// Gradient placeholder tinted with the category accent
fn placeholder_svg(category: Category) -> String {
    let accent = category.accent();
    format!(
        r##"<svg class="card-image" viewBox="0 0 400 200" xmlns="http://www.w3.org/2000/svg" role="img" aria-label="{category}">
                        <defs><linearGradient id="bg-{category}" x1="0" y1="0" x2="1" y2="1">
                            <stop offset="0%" stop-color="#0f0f23"/>
                            <stop offset="100%" stop-color="{accent}" stop-opacity="0.6"/>
                        </linearGradient></defs>
                        <rect width="400" height="200" fill="url(#bg-{category})"/>
                        <circle cx="200" cy="100" r="40" fill="{accent}" fill-opacity="0.35"/>
                        <text x="200" y="106" text-anchor="middle" fill="#fff" font-size="16" font-family="sans-serif">{category}</text>
                    </svg>"##
    )
}

/// Image candidates on an article page, best first
fn image_candidates(html: &str, page: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut candidates = Vec::new();
    for (selector, attr) in IMAGE_SELECTORS {
        let Some(selector) = parse_selector(selector) else {
            continue;
        };
        for element in document.select(&selector) {
            if let Some(src) = element
                .value()
                .attr(attr)
                .and_then(|value| resolve_link(value, page))
            {
                if !candidates.contains(&src) {
                    candidates.push(src);
                }
            }
        }
    }
    candidates
}

/// Find a usable lead image for an article
///
/// Returns `None` when the page cannot be fetched or no candidate answers a
/// HEAD request with an image content-type.
#[instrument(skip(fetcher))]
pub async fn find_article_image(fetcher: &Fetcher, link: &str) -> Option<String> {
    let page = Url::parse(link).ok()?;
    let html = match fetcher.fetch_with_timeout(link, IMAGE_PAGE_TIMEOUT).await {
        Ok(html) => html,
        Err(e) => {
            debug!("No article page for {}: {}", link, e);
            return None;
        }
    };

    for candidate in image_candidates(&html, &page) {
        if fetcher.probe_image(&candidate).await {
            return Some(candidate);
        }
    }
    None
}

/// Look up images for `items`, keeping the existing image where `wanted` is false
///
/// Results are in item order. At most [`IMAGE_LOOKUP_CONCURRENCY`] article
/// pages are fetched at once.
pub async fn article_images<F>(fetcher: &Fetcher, items: &[ContentItem], wanted: F) -> Vec<Option<String>>
where
    F: Fn(&ContentItem) -> bool,
{
    let lookups: Vec<_> = items
        .iter()
        .map(|item| {
            let lookup = wanted(item);
            async move {
                if lookup {
                    find_article_image(fetcher, &item.link).await
                } else {
                    item.image.clone()
                }
            }
        })
        .collect();
    stream::iter(lookups)
        .buffered(IMAGE_LOOKUP_CONCURRENCY)
        .collect()
        .await
}

/// Fill in missing images for selected items
pub async fn with_article_images(fetcher: &Fetcher, mut items: Vec<ContentItem>) -> Vec<ContentItem> {
    let images = article_images(fetcher, &items, |item| item.selected && item.image.is_none()).await;

    for (item, image) in items.iter_mut().zip(images) {
        item.image = image;
    }
    items
}
