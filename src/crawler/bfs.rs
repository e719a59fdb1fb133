//! Bounded breadth-first crawl over same-origin links

use std::collections::{HashSet, VecDeque};

use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::crawler::error::FetchError;
use crate::crawler::fetcher::{Fetcher, SEED_TIMEOUT};
use crate::crawler::links::{extract_links, LinkFilter};
use crate::crawler::{CrawlTarget, CrawledPage, CrawlerConfig};

/// Sequential crawler that fetches every accepted page exactly once
#[derive(Debug, Clone)]
pub struct Crawler {
    fetcher: Fetcher,
    config: CrawlerConfig,
}

impl Crawler {
    /// Create a crawler from a fetcher and configuration
    pub fn new(fetcher: Fetcher, config: CrawlerConfig) -> Self {
        Self { fetcher, config }
    }

    /// The configuration in use
    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Crawl from `seed`, returning fetched pages in visit order (seed first)
    ///
    /// A failure on the seed page is returned; failures on any other page
    /// skip that page. At most `max_pages` URLs are ever accepted.
    #[instrument(skip(self), fields(max_pages = self.config.max_pages, recursive = self.config.recursive))]
    pub async fn crawl(&self, seed: &str) -> Result<Vec<CrawledPage>, FetchError> {
        let mut seed_url = Url::parse(seed)?;
        seed_url.set_fragment(None);

        let filter = LinkFilter::new(&seed_url, &self.config.exclude_paths);
        let max_pages = self.config.max_pages.max(1);

        let mut visited: HashSet<String> = HashSet::from([seed_url.to_string()]);
        let mut queue = VecDeque::from([CrawlTarget { url: seed_url }]);
        let mut pages = Vec::new();
        let mut is_seed = true;

        while let Some(target) = queue.pop_front() {
            if !is_seed && self.config.delay_ms > 0 {
                tokio::time::sleep(self.config.delay()).await;
            }

            let timeout = if is_seed {
                SEED_TIMEOUT
            } else {
                self.config.page_timeout
            };

            match self
                .fetcher
                .fetch_with_timeout(target.url.as_str(), timeout)
                .await
            {
                Ok(html) => {
                    if (is_seed || self.config.recursive) && visited.len() < max_pages {
                        let links = extract_links(
                            &html,
                            &target.url,
                            &filter,
                            &self.config.priority_selectors,
                        );
                        for url in links {
                            if visited.len() >= max_pages {
                                break;
                            }
                            if visited.insert(url.to_string()) {
                                queue.push_back(CrawlTarget { url });
                            }
                        }
                        debug!("{} queued, {} visited", queue.len(), visited.len());
                    }

                    pages.push(CrawledPage {
                        url: target.url.to_string(),
                        html,
                    });
                }
                Err(e) if is_seed => return Err(e),
                Err(e) => warn!("Skipping {}: {}", target.url, e),
            }

            is_seed = false;
        }

        info!("Crawled {} page(s) from {}", pages.len(), seed);
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::FetcherConfig;
    use mockito::{Server, ServerGuard};

    fn page(links: &[&str]) -> String {
        let anchors: String = links
            .iter()
            .map(|href| format!("<a href=\"{href}\">link to {href}</a>"))
            .collect();
        format!(
            "<html><head><title>Page</title></head><body><p>{}</p>{}</body></html>",
            "filler text ".repeat(10),
            anchors
        )
    }

    async fn serve(server: &mut ServerGuard, path: &str, links: &[&str]) {
        server
            .mock("GET", path)
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(page(links))
            .create_async()
            .await;
    }

    fn crawler(config: CrawlerConfig) -> Crawler {
        Crawler::new(Fetcher::new(FetcherConfig::default()).unwrap(), config)
    }

    #[tokio::test]
    async fn test_crawl_terminates_on_cycles() {
        let mut server = Server::new_async().await;
        serve(&mut server, "/", &["/a", "/b"]).await;
        serve(&mut server, "/a", &["/", "/b", "/a"]).await;
        serve(&mut server, "/b", &["/a", "/"]).await;

        let config = CrawlerConfig::builder().delay_ms(0).recursive(true).build();
        let pages = crawler(config).crawl(&server.url()).await.unwrap();

        let urls: Vec<&str> = pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(pages.len(), 3);
        assert_eq!(urls[0], format!("{}/", server.url()));
        let unique: HashSet<&str> = urls.iter().copied().collect();
        assert_eq!(unique.len(), 3);
    }

    #[tokio::test]
    async fn test_crawl_respects_max_pages() {
        let mut server = Server::new_async().await;
        let links: Vec<String> = (0..20).map(|i| format!("/p{i}")).collect();
        let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
        serve(&mut server, "/", &link_refs).await;
        for link in &links {
            serve(&mut server, link, &[]).await;
        }

        let config = CrawlerConfig::builder().max_pages(5).delay_ms(0).build();
        let pages = crawler(config).crawl(&server.url()).await.unwrap();
        assert_eq!(pages.len(), 5);
        assert!(pages[1].url.ends_with("/p0"));
    }

    #[tokio::test]
    async fn test_crawl_excludes_filtered_links() {
        let mut server = Server::new_async().await;
        serve(
            &mut server,
            "/",
            &["/login", "/cart", "/file.pdf", "mailto:x@y.z", "#top", "https://other.org/", "/ok"],
        )
        .await;
        serve(&mut server, "/ok", &[]).await;

        let config = CrawlerConfig::builder().delay_ms(0).build();
        let pages = crawler(config).crawl(&server.url()).await.unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[1].url.ends_with("/ok"));
    }

    #[tokio::test]
    async fn test_crawl_single_level_by_default() {
        let mut server = Server::new_async().await;
        serve(&mut server, "/", &["/a"]).await;
        serve(&mut server, "/a", &["/deep"]).await;
        serve(&mut server, "/deep", &[]).await;

        let config = CrawlerConfig::builder().delay_ms(0).build();
        let pages = crawler(config).crawl(&server.url()).await.unwrap();
        assert_eq!(pages.len(), 2);
    }

    #[tokio::test]
    async fn test_crawl_seed_failure_is_fatal() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(500)
            .create_async()
            .await;

        let config = CrawlerConfig::builder().delay_ms(0).build();
        let result = crawler(config).crawl(&server.url()).await;
        assert!(matches!(result, Err(FetchError::HttpStatus { status: 500 })));
    }

    #[tokio::test]
    async fn test_crawl_skips_failing_pages() {
        let mut server = Server::new_async().await;
        serve(&mut server, "/", &["/broken", "/fine"]).await;
        server
            .mock("GET", "/broken")
            .with_status(404)
            .create_async()
            .await;
        serve(&mut server, "/fine", &[]).await;

        let config = CrawlerConfig::builder().delay_ms(0).build();
        let pages = crawler(config).crawl(&server.url()).await.unwrap();
        let urls: Vec<&str> = pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls.len(), 2);
        assert!(urls[1].ends_with("/fine"));
    }
}
