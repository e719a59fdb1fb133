//! Prompt text for model-driven news extraction

const CATEGORY_LIST: &str =
    "Technology, Business, Politics, Sports, Entertainment, Health, Science, World, General";

/// System preamble for the main extraction pass
pub const NEWS_PREAMBLE: &str = r#"You are a news analyst who extracts news items from the HTML of news websites.

Find every real news item on the page: breaking news, featured stories, regular
articles and short briefs from every section. Skip advertisements, navigation
and promotional content.

Give each item exactly one category:
- Technology: software, hardware, AI, startups, the internet
- Business: finance, economy, markets, companies, earnings
- Politics: government, elections, policy
- Sports: games, athletes, competitions
- Entertainment: film, music, celebrities, TV, gaming
- Health: medicine, wellness, healthcare
- Science: research, space, environment, climate
- World: international events and conflicts
- General: anything else

Give each item an importance:
- high: breaking news and major events
- medium: regular stories and updates
- low: minor updates and brief mentions

Answer with a JSON array and nothing else:
[
  {
    "title": "headline",
    "link": "absolute URL of the article",
    "description": "one to three sentence summary",
    "category": "one of the categories above",
    "importance": "high, medium or low",
    "timestamp": "publication time if shown, otherwise recent"
  }
]

Aim for at least 10 items, and more when the page has them."#;

/// System preamble for the broader second pass
pub const SECOND_PASS_PREAMBLE: &str = "You extract every news item, article or story you can \
find in HTML, including minor briefs, opinion pieces and items in sidebars and lists. \
Be inclusive rather than selective. Answer with a JSON array of objects with title, link, \
description, category, importance and timestamp fields, and nothing else.";

/// System preamble for individual subpages
pub const SUBPAGE_PREAMBLE: &str =
    "You extract news items from HTML and answer with a JSON array only.";

/// User prompt for the main extraction pass
pub fn news_prompt(url: &str, page_title: &str, pages: &[String], excerpt: &str) -> String {
    format!(
        "Extract all news items from this HTML taken from {url} ({page_title}).\n\
         It may combine several pages: {pages}\n\n\
         HTML:\n{excerpt}\n\n\
         Pages analyzed: {count}\n\
         Use only these categories: {CATEGORY_LIST}",
        pages = pages.join(", "),
        count = pages.len(),
    )
}

/// User prompt for the second pass
pub fn second_pass_prompt(excerpt: &str) -> String {
    format!(
        "Look through this HTML again and list every news item, article or story, \
         not just the top headlines:\n\n{excerpt}\n\n\
         Use only these categories: {CATEGORY_LIST}"
    )
}

/// Short prompt used for individual subpages
pub fn subpage_prompt(url: &str, excerpt: &str) -> String {
    format!(
        "Extract all news items from this HTML from {url}. Answer with a JSON array of \
         objects with title, link, description, category (one of: {CATEGORY_LIST}), \
         importance and timestamp fields:\n\n{excerpt}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_news_prompt_lists_pages() {
        let pages = vec![
            "https://example.com/".to_string(),
            "https://example.com/news".to_string(),
        ];
        let prompt = news_prompt("https://example.com/", "Example", &pages, "<p>x</p>");
        assert!(prompt.contains("https://example.com/, https://example.com/news"));
        assert!(prompt.contains("Pages analyzed: 2"));
        assert!(prompt.contains(CATEGORY_LIST));
    }
}
