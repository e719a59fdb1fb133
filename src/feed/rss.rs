//! RSS 2.0 serialization

use chrono::{DateTime, Utc};
use quick_xml::se::to_string;
use serde::Serialize;
use tracing::instrument;

use crate::extract::ContentItem;
use crate::feed::{FeedDocument, FeedError};

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
const NEWS_NS: &str = "https://pagefeed.dev/ns/news";

#[derive(Serialize)]
#[serde(rename = "rss")]
struct Rss<'a> {
    #[serde(rename = "@version")]
    version: &'static str,
    #[serde(rename = "@xmlns:atom")]
    xmlns_atom: &'static str,
    #[serde(rename = "@xmlns:news", skip_serializing_if = "Option::is_none")]
    xmlns_news: Option<&'static str>,
    channel: Channel<'a>,
}

#[derive(Serialize)]
struct Channel<'a> {
    title: &'a str,
    link: &'a str,
    description: &'a str,
    language: &'static str,
    #[serde(rename = "lastBuildDate")]
    last_build_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    generator: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<u32>,
    #[serde(rename = "category")]
    categories: &'a [String],
    #[serde(rename = "atom:link")]
    atom_link: AtomLink<'a>,
    #[serde(rename = "item")]
    items: Vec<Item<'a>>,
}

#[derive(Serialize)]
struct AtomLink<'a> {
    #[serde(rename = "@href")]
    href: &'a str,
    #[serde(rename = "@rel")]
    rel: &'static str,
    #[serde(rename = "@type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct Guid<'a> {
    #[serde(rename = "@isPermaLink")]
    is_perma_link: bool,
    #[serde(rename = "$text")]
    value: &'a str,
}

#[derive(Serialize)]
struct Item<'a> {
    title: &'a str,
    link: &'a str,
    description: &'a str,
    guid: Guid<'a>,
    #[serde(rename = "pubDate")]
    pub_date: &'a str,
    #[serde(rename = "category")]
    categories: Vec<&'static str>,
    #[serde(rename = "news:importance", skip_serializing_if = "Option::is_none")]
    importance: Option<&'static str>,
    #[serde(rename = "news:source", skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
    #[serde(rename = "news:rank", skip_serializing_if = "Option::is_none")]
    rank: Option<u32>,
    #[serde(rename = "news:confidence", skip_serializing_if = "Option::is_none")]
    confidence: Option<&'static str>,
}

impl<'a> Item<'a> {
    fn new(item: &'a ContentItem, pub_date: &'a str) -> Self {
        Self {
            title: &item.title,
            link: &item.link,
            description: &item.description,
            guid: Guid {
                is_perma_link: true,
                value: &item.link,
            },
            pub_date,
            categories: item.category.iter().map(|c| c.as_str()).collect(),
            importance: item.importance.map(|i| i.as_str()),
            source: item.source.as_deref(),
            rank: item.rank,
            confidence: item.confidence.map(|c| c.as_str()),
        }
    }

    fn is_news(&self) -> bool {
        self.importance.is_some() || self.rank.is_some() || self.confidence.is_some()
    }
}

/// Render a feed as RSS 2.0, dated now
pub fn render_rss(doc: &FeedDocument) -> Result<String, FeedError> {
    render_rss_at(doc, Utc::now())
}

/// Render a feed as RSS 2.0 with the given build time
#[instrument(skip(doc), fields(items = doc.items.len()))]
pub fn render_rss_at(doc: &FeedDocument, now: DateTime<Utc>) -> Result<String, FeedError> {
    let date = now.to_rfc2822();
    let items: Vec<Item<'_>> = doc.items.iter().map(|item| Item::new(item, &date)).collect();
    let has_news = items.iter().any(Item::is_news);

    let rss = Rss {
        version: "2.0",
        xmlns_atom: ATOM_NS,
        xmlns_news: has_news.then_some(NEWS_NS),
        channel: Channel {
            title: &doc.title,
            link: &doc.site_url,
            description: &doc.description,
            language: "en",
            last_build_date: date.clone(),
            generator: doc.generator.as_deref(),
            ttl: doc.ttl,
            categories: &doc.categories,
            atom_link: AtomLink {
                href: &doc.feed_url,
                rel: "self",
                kind: "application/rss+xml",
            },
            items,
        },
    };

    let xml = to_string(&rss)?;
    Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{xml}"))
}
