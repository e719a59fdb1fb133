//! Content extraction helpers shared by inference, extraction and diagnostics
//!
//! Everything here is synchronous: `scraper::Html` is not `Send`, so parsed
//! documents must never be held across an `.await`.

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

/// Subtrees that never carry content
pub const NOISE_SELECTORS: &[&str] = &["script", "style", "noscript"];

/// Page chrome removed before asking a model to find news items
pub const CHROME_SELECTORS: &[&str] = &[
    "script",
    "style",
    "noscript",
    "nav",
    "footer",
    ".sidebar",
    ".ads",
    ".advertisement",
    ".social-share",
    ".comments",
];

const CONTAINER_FALLBACKS: &str = ".content, .main, #content, #main";

/// Parse a CSS selector, logging and discarding invalid input
pub fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(selector) => Some(selector),
        Err(e) => {
            warn!("Failed to parse selector '{}': {}", selector, e);
            None
        }
    }
}

/// Text content of an element with whitespace runs collapsed
pub fn element_text(element: &ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max` characters, respecting char boundaries
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Text of the first element matching `selector`, if any and non-empty
pub fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = parse_selector(selector)?;
    document
        .select(&selector)
        .next()
        .map(|element| element_text(&element))
        .filter(|text| !text.is_empty())
}

/// Text of the `<title>` element
pub fn page_title(document: &Html) -> Option<String> {
    first_text(document, "title")
}

/// Content of `<meta name="description">`
pub fn meta_description(document: &Html) -> Option<String> {
    let selector = parse_selector("meta[name='description']")?;
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Feed title suggestion: `<title>`, then the first `<h1>`, then a generic name
pub fn suggested_title(document: &Html) -> String {
    page_title(document)
        .or_else(|| first_text(document, "h1"))
        .unwrap_or_else(|| "RSS Feed".to_string())
}

/// Number of elements matching `selector`; invalid selectors count as zero
pub fn count_matches(document: &Html, selector: &str) -> usize {
    parse_selector(selector)
        .map(|selector| document.select(&selector).count())
        .unwrap_or(0)
}

/// Remove every subtree matching one of `selectors` from the document
pub fn remove_subtrees(document: &mut Html, selectors: &[&str]) {
    for selector in selectors.iter().filter_map(|s| parse_selector(s)) {
        let ids: Vec<_> = document.select(&selector).map(|element| element.id()).collect();
        for id in ids {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }
    }
}

/// Inner HTML of the region most likely to hold the page's content
///
/// Tries `main`, then the parent of the first `article`, then the usual
/// content containers, then `body`.
pub fn main_content_html(document: &Html) -> String {
    if let Some(main) = select_first(document, "main") {
        return main.inner_html();
    }

    if let Some(parent) = select_first(document, "article")
        .and_then(|article| article.parent())
        .and_then(ElementRef::wrap)
    {
        return parent.inner_html();
    }

    if let Some(container) = select_first(document, CONTAINER_FALLBACKS) {
        return container.inner_html();
    }

    select_first(document, "body")
        .map(|body| body.inner_html())
        .unwrap_or_else(|| document.root_element().inner_html())
}

/// Prepare a bounded HTML excerpt for a model prompt
///
/// Removes the `remove` subtrees, picks the main content region and truncates
/// it to `max_chars`, appending `...` when anything was cut.
pub fn prepare_excerpt(html: &str, remove: &[&str], max_chars: usize) -> String {
    let mut document = Html::parse_document(html);
    remove_subtrees(&mut document, remove);

    let content = main_content_html(&document);
    let content = content.trim();
    if content.chars().count() > max_chars {
        format!("{}...", truncate_chars(content, max_chars))
    } else {
        content.to_string()
    }
}

fn select_first<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = parse_selector(selector)?;
    document.select(&selector).next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_metadata() {
        let document = Html::parse_document(
            r#"<html><head><title> Test  Page </title>
            <meta name="description" content="Test description"></head>
            <body><h1>Heading</h1></body></html>"#,
        );

        assert_eq!(page_title(&document).as_deref(), Some("Test Page"));
        assert_eq!(
            meta_description(&document).as_deref(),
            Some("Test description")
        );
        assert_eq!(suggested_title(&document), "Test Page");
    }

    #[test]
    fn test_suggested_title_fallbacks() {
        let with_h1 = Html::parse_document("<html><body><h1>Only Heading</h1></body></html>");
        assert_eq!(suggested_title(&with_h1), "Only Heading");

        let bare = Html::parse_document("<html><body><p>nothing</p></body></html>");
        assert_eq!(suggested_title(&bare), "RSS Feed");
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn test_prepare_excerpt_strips_noise_and_prefers_main() {
        let html = r#"<html><body>
            <nav>menu</nav>
            <main><script>var x = 1;</script><p>Real content</p><style>p{}</style></main>
            </body></html>"#;

        let excerpt = prepare_excerpt(html, NOISE_SELECTORS, 8000);
        assert!(excerpt.contains("Real content"));
        assert!(!excerpt.contains("var x"));
        assert!(!excerpt.contains("menu"));
    }

    #[test]
    fn test_prepare_excerpt_uses_article_parent() {
        let html = r#"<html><body><div id="outer"><section class="list">
            <article>One</article><article>Two</article></section>
            <aside>elsewhere</aside></div></body></html>"#;

        let excerpt = prepare_excerpt(html, NOISE_SELECTORS, 8000);
        assert!(excerpt.starts_with("<article>"));
        assert!(!excerpt.contains("elsewhere"));
    }

    #[test]
    fn test_prepare_excerpt_truncates() {
        let html = format!("<html><body>{}</body></html>", "a".repeat(500));
        let excerpt = prepare_excerpt(&html, NOISE_SELECTORS, 100);
        assert_eq!(excerpt.chars().count(), 103);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn test_chrome_removal() {
        let html = r#"<html><body><div class="sidebar">side</div>
            <p>story</p><footer>foot</footer></body></html>"#;
        let excerpt = prepare_excerpt(html, CHROME_SELECTORS, 1000);
        assert!(excerpt.contains("story"));
        assert!(!excerpt.contains("side"));
        assert!(!excerpt.contains("foot"));
    }

    #[test]
    fn test_count_matches_invalid_selector() {
        let document = Html::parse_document("<p>a</p><p>b</p>");
        assert_eq!(count_matches(&document, "p"), 2);
        assert_eq!(count_matches(&document, "p[[["), 0);
    }
}
