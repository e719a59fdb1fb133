//! # Application configuration
//!
//! Settings come from the process environment, after loading a `.env` file
//! if one is present. Every value has a default except the model API keys;
//! without a key the corresponding model is simply not used.

use anyhow::Context;
use std::collections::HashMap;

use crate::crawler::CrawlerConfig;
use crate::model::{self, SharedModel, DEFAULT_GEMINI_MODEL, DEFAULT_GROK_MODEL};
use crate::pipeline::DEFAULT_BASE_URL;

/// Runtime configuration for the server and CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Base URL that generated feed links point at
    pub base_url: String,
    pub gemini_api_key: Option<String>,
    pub xai_api_key: Option<String>,
    pub gemini_model: String,
    pub grok_model: String,
    pub crawl_max_pages: usize,
    pub crawl_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            base_url: DEFAULT_BASE_URL.to_string(),
            gemini_api_key: None,
            xai_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            grok_model: DEFAULT_GROK_MODEL.to_string(),
            crawl_max_pages: 50,
            crawl_delay_ms: 200,
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the environment
    pub fn from_env() -> anyhow::Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e).context("Failed to load .env file");
            }
        }
        Self::from_vars(std::env::vars())
    }

    /// Build a configuration from key/value pairs
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> anyhow::Result<Self> {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .collect();
        let defaults = Self::default();
        let get = |key: &str| vars.get(key).map(|value| value.trim().to_string());

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: get("PORT")
                .map(|v| v.parse().with_context(|| format!("PORT must be a port number, got '{v}'")))
                .transpose()?
                .unwrap_or(defaults.port),
            base_url: get("BASE_URL").unwrap_or(defaults.base_url),
            gemini_api_key: get("GEMINI_API_KEY"),
            xai_api_key: get("XAI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            grok_model: get("GROK_MODEL").unwrap_or(defaults.grok_model),
            crawl_max_pages: get("CRAWL_MAX_PAGES")
                .map(|v| v.parse().with_context(|| format!("CRAWL_MAX_PAGES must be a number, got '{v}'")))
                .transpose()?
                .unwrap_or(defaults.crawl_max_pages),
            crawl_delay_ms: get("CRAWL_DELAY_MS")
                .map(|v| v.parse().with_context(|| format!("CRAWL_DELAY_MS must be a number, got '{v}'")))
                .transpose()?
                .unwrap_or(defaults.crawl_delay_ms),
        })
    }

    /// Crawl defaults from this configuration
    pub fn crawler_config(&self) -> CrawlerConfig {
        CrawlerConfig::builder()
            .max_pages(self.crawl_max_pages)
            .delay_ms(self.crawl_delay_ms)
            .build()
    }

    /// Gemini model for selector inference, if a key is configured
    pub fn gemini(&self) -> Option<SharedModel> {
        self.gemini_api_key
            .as_deref()
            .map(|key| model::gemini(key, &self.gemini_model))
    }

    /// Grok model for news scanning, if a key is configured
    pub fn grok(&self) -> Option<SharedModel> {
        self.xai_api_key
            .as_deref()
            .map(|key| model::grok(key, &self.grok_model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_vars(Vec::new()).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.gemini().is_none());
        assert!(config.grok().is_none());
        assert_eq!(config.crawler_config().max_pages, 50);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_vars(vars(&[
            ("PORT", "8080"),
            ("BASE_URL", "https://feeds.example.com"),
            ("GEMINI_API_KEY", "key"),
            ("XAI_API_KEY", "  "),
            ("CRAWL_MAX_PAGES", "5"),
            ("CRAWL_DELAY_MS", "0"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.base_url, "https://feeds.example.com");
        assert_eq!(config.gemini_api_key.as_deref(), Some("key"));
        assert_eq!(config.xai_api_key, None);
        assert_eq!(config.crawler_config().max_pages, 5);
        assert_eq!(config.crawler_config().delay_ms, 0);
    }

    #[test]
    fn test_invalid_port() {
        let err = AppConfig::from_vars(vars(&[("PORT", "http")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
