//! Deduplication and ordering of extracted items

use std::collections::HashSet;

use crate::extract::ContentItem;

/// Characters of the normalized title used in [`DedupeKey::LinkAndTitle`]
pub const TITLE_KEY_CHARS: usize = 50;

/// What makes two items duplicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupeKey {
    /// Same link
    Link,
    /// Same link and same lowercase title prefix
    LinkAndTitle,
}

impl DedupeKey {
    fn key(&self, item: &ContentItem) -> (String, String) {
        match self {
            Self::Link => (item.link.clone(), String::new()),
            Self::LinkAndTitle => {
                let title: String = item
                    .title
                    .trim()
                    .to_lowercase()
                    .chars()
                    .take(TITLE_KEY_CHARS)
                    .collect();
                (item.link.clone(), title)
            }
        }
    }
}

/// Drop later duplicates, keeping the first occurrence of each key
pub fn dedupe(items: Vec<ContentItem>, key: DedupeKey) -> Vec<ContentItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key.key(item)))
        .collect()
}

/// Sort by title, ignoring case; equal titles keep their order
pub fn sort_by_title(items: &mut [ContentItem]) {
    items.sort_by_cached_key(|item| item.title.to_lowercase());
}

/// Sort by importance (high first), then rank ascending with unranked last
pub fn sort_by_importance(items: &mut [ContentItem]) {
    items.sort_by(|a, b| {
        b.importance
            .cmp(&a.importance)
            .then_with(|| match (a.rank, b.rank) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
    });
}

/// Keep at most `max` items
pub fn truncate(mut items: Vec<ContentItem>, max: usize) -> Vec<ContentItem> {
    items.truncate(max);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Importance;

    fn item(title: &str, link: &str) -> ContentItem {
        ContentItem::new(link, title, link, "", "https://example.com/")
    }

    fn ranked(title: &str, importance: Importance, rank: Option<u32>) -> ContentItem {
        let mut item = item(title, &format!("https://example.com/{title}"));
        item.importance = Some(importance);
        item.rank = rank;
        item
    }

    #[test]
    fn test_dedupe_first_wins_and_idempotent() {
        let mut first = item("First copy", "https://example.com/x");
        first.source_page = "https://example.com/page1".to_string();
        let mut second = item("Second copy", "https://example.com/x");
        second.source_page = "https://example.com/page2".to_string();
        let other = item("Other", "https://example.com/y");

        let once = dedupe(vec![first, second, other], DedupeKey::Link);
        assert_eq!(once.len(), 2);
        assert_eq!(once[0].source_page, "https://example.com/page1");

        let twice = dedupe(once.clone(), DedupeKey::Link);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_dedupe_link_and_title() {
        let items = vec![
            item("Big News Today", "https://example.com/x"),
            item("  big news today ", "https://example.com/x"),
            item("Different story", "https://example.com/x"),
            item("Big News Today", "https://example.com/z"),
        ];
        let unique = dedupe(items, DedupeKey::LinkAndTitle);
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_dedupe_title_prefix_only() {
        let base = "a".repeat(50);
        let items = vec![
            item(&format!("{base} one"), "https://example.com/x"),
            item(&format!("{base} two"), "https://example.com/x"),
        ];
        assert_eq!(dedupe(items, DedupeKey::LinkAndTitle).len(), 1);
    }

    #[test]
    fn test_sort_by_title_case_insensitive_stable() {
        let mut items = vec![
            item("banana", "https://example.com/1"),
            item("Apple", "https://example.com/2"),
            item("apple", "https://example.com/3"),
        ];
        sort_by_title(&mut items);
        let links: Vec<&str> = items.iter().map(|i| i.link.as_str()).collect();
        assert_eq!(
            links,
            vec![
                "https://example.com/2",
                "https://example.com/3",
                "https://example.com/1"
            ]
        );
    }

    #[test]
    fn test_sort_by_importance() {
        let mut items = vec![
            ranked("low", Importance::Low, Some(1)),
            ranked("high", Importance::High, Some(5)),
            ranked("medium", Importance::Medium, Some(2)),
        ];
        sort_by_importance(&mut items);
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["high", "medium", "low"]);
    }

    #[test]
    fn test_sort_by_rank_within_tier() {
        let mut items = vec![
            ranked("unranked", Importance::Medium, None),
            ranked("second", Importance::Medium, Some(7)),
            ranked("first", Importance::Medium, Some(2)),
        ];
        sort_by_importance(&mut items);
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "unranked"]);
    }

    #[test]
    fn test_truncate() {
        let items = vec![
            item("one", "https://example.com/1"),
            item("two", "https://example.com/2"),
        ];
        assert_eq!(truncate(items.clone(), 1).len(), 1);
        assert_eq!(truncate(items, 10).len(), 2);
    }
}
