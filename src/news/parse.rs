//! Turning model answers into news items

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use url::Url;

use crate::extract::{ContentItem, Importance};
use crate::inference::response::parse_model_json;
use crate::news::Category;

/// A news item as the model described it, before normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawNewsItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub category: String,
    pub importance: String,
    pub timestamp: String,
}

impl RawNewsItem {
    fn from_value(value: &Value) -> Self {
        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string()
        };
        Self {
            title: field("title"),
            link: field("link"),
            description: field("description"),
            category: field("category"),
            importance: field("importance"),
            timestamp: field("timestamp"),
        }
    }
}

/// How the items of one model answer should be filled in
#[derive(Debug, Clone, Copy)]
pub struct Normalization {
    /// Importance for items that do not state a valid one
    pub default_importance: Importance,
    /// Added to each item's position to form its rank
    pub rank_offset: u32,
}

/// Parse a JSON array answer
pub fn parse_news_json(text: &str) -> Option<Vec<RawNewsItem>> {
    let values: Vec<Value> = parse_model_json(text, true).ok()?;
    Some(values.iter().map(RawNewsItem::from_value).collect())
}

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+[.)]|[-*•])\s*").expect("list marker regex"));
static LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(title|headline|link|url|description|summary)\s*:\s*")
        .expect("label regex")
});

/// Recover items from a plain-text answer
///
/// Recognizes numbered or bulleted headlines, `Title:`/`Headline:` lines,
/// `Link:` or bare URL lines and `Description:` lines. Any other line of
/// plausible headline length starts a new item.
pub fn parse_news_lines(text: &str) -> Vec<RawNewsItem> {
    let mut items = Vec::new();
    let mut current: Option<RawNewsItem> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let line = LIST_MARKER.replace(line, "");
        let line = line.trim();

        let (label, rest) = match LABEL.captures(line) {
            Some(caps) => {
                let label = caps[1].to_ascii_lowercase();
                (Some(label), line[caps[0].len()..].trim())
            }
            None => (None, line),
        };

        match label.as_deref() {
            Some("link" | "url") => {
                if let Some(item) = current.as_mut() {
                    item.link = rest.to_string();
                }
            }
            Some("description" | "summary") => {
                if let Some(item) = current.as_mut() {
                    item.description = rest.to_string();
                }
            }
            Some(_) => start_item(&mut items, &mut current, rest),
            None if rest.starts_with("http://") || rest.starts_with("https://") => {
                if let Some(item) = current.as_mut() {
                    item.link = rest.to_string();
                }
            }
            None => {
                let len = rest.chars().count();
                if (20..200).contains(&len) && !rest.contains("http") {
                    start_item(&mut items, &mut current, rest);
                }
            }
        }
    }

    items.extend(current.filter(|item| !item.title.is_empty()));
    items
}

fn start_item(items: &mut Vec<RawNewsItem>, current: &mut Option<RawNewsItem>, title: &str) {
    if let Some(previous) = current.take().filter(|item| !item.title.is_empty()) {
        items.push(previous);
    }
    *current = Some(RawNewsItem {
        title: title.trim_matches(|c| c == '*' || c == '"').trim().to_string(),
        ..Default::default()
    });
}

/// Absolute form of `link`, falling back to `base` when empty or unresolvable
pub fn make_absolute(link: &str, base: &str) -> String {
    let link = link.trim();
    if link.is_empty() {
        return base.to_string();
    }
    Url::parse(base)
        .and_then(|base_url| base_url.join(link))
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(String::from)
        .unwrap_or_else(|| base.to_string())
}

/// Convert raw items into news items for the page at `base`
///
/// Items without a title are dropped; ranks count the surviving items.
pub fn normalize_items(raw: Vec<RawNewsItem>, base: &str, rules: Normalization) -> Vec<ContentItem> {
    let source = Url::parse(base)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string));

    raw.into_iter()
        .filter(|item| !item.title.is_empty())
        .enumerate()
        .map(|(idx, item)| {
            let rank = idx as u32 + rules.rank_offset;
            let mut news = ContentItem::new(
                format!("{base}#news-{rank}"),
                item.title,
                make_absolute(&item.link, base),
                item.description,
                base,
            );
            news.category = Some(Category::normalize(&item.category));
            news.importance =
                Some(Importance::parse(&item.importance).unwrap_or(rules.default_importance));
            news.timestamp = Some(if item.timestamp.is_empty() {
                "recent".to_string()
            } else {
                item.timestamp
            });
            news.rank = Some(rank);
            news.source = source.clone();
            news
        })
        .collect()
}
