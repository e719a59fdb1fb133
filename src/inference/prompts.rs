//! Prompt text for model-guided selector inference

/// System preamble for selector inference
pub const SELECTOR_PREAMBLE: &str = "You are an expert web scraper. You study HTML and \
answer with CSS selectors that pick out the repeating content items of a page, \
suitable for building an RSS feed. You answer with a single JSON object and nothing else.";

/// Build the user prompt for selector inference
pub fn selector_prompt(url: &str, excerpt: &str) -> String {
    format!(
        r#"Find the repeating content items (articles, posts, news items, products, listings) in this HTML from {url}.

HTML (truncated):
{excerpt}

Answer with exactly this JSON shape:
{{
  "item": "selector for each item container",
  "title": "selector for the title inside an item",
  "link": "selector for the link inside an item",
  "description": "selector for a summary inside an item, or an empty string"
}}

Rules:
- "title", "link" and "description" are matched inside each "item" container.
- "item", "title" and "link" must never be empty. Use broad fallbacks such as
  "article, .item, .card, .post", "h2, h3, .title, a" or "a[href]" when unsure.
- Prefer semantic elements (article, h1-h6, a, p) and keep selectors simple.
- Use only standard CSS selector syntax.
- Return only the JSON object."#
    )
}
