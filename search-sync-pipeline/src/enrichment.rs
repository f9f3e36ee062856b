//! Frontend fetch: enriching items with the text of their rendered page.

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, instrument};

use crate::errors::EnrichmentError;
use crate::item::IndexableItem;

/// Fetches page content for an item.
#[async_trait]
pub trait ContentEnricher: Send + Sync {
    /// Fetch the searchable text of `item`'s rendered page.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Extracted text, never empty
    /// * `Err(EnrichmentError)` - If the page could not be fetched or held no text
    async fn fetch_content(&self, item: &IndexableItem) -> Result<String, EnrichmentError>;
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    pub timeout: Duration,
    /// Extracted text is cut to this many characters.
    pub max_content_chars: usize,
    pub user_agent: String,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_content_chars: 50_000,
            user_agent: concat!("search-sync/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Reduces an HTML page to whitespace-normalised text.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    hidden_blocks: Regex,
    tags: Regex,
    whitespace: Regex,
}

impl TextExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            hidden_blocks: Regex::new(r"(?is)<(script|style|noscript|template)\b.*?</(script|style|noscript|template)\s*>|<!--.*?-->")?,
            tags: Regex::new(r"(?s)<[^>]*>")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    pub fn extract(&self, html: &str, max_chars: usize) -> String {
        let text = self.hidden_blocks.replace_all(html, " ");
        let text = self.tags.replace_all(&text, " ");
        let text = decode_entities(&text);
        let text = self.whitespace.replace_all(&text, " ");
        text.trim().chars().take(max_chars).collect()
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Fetches item URLs over HTTP.
#[derive(Debug, Clone)]
pub struct HttpContentFetcher {
    client: reqwest::Client,
    extractor: TextExtractor,
    config: EnrichmentConfig,
}

impl HttpContentFetcher {
    pub fn new(config: EnrichmentConfig) -> Result<Self, EnrichmentError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| EnrichmentError::configuration(e.to_string()))?;
        let extractor =
            TextExtractor::new().map_err(|e| EnrichmentError::configuration(e.to_string()))?;

        Ok(Self {
            client,
            extractor,
            config,
        })
    }
}

#[async_trait]
impl ContentEnricher for HttpContentFetcher {
    #[instrument(skip(self, item), fields(item_id = item.item_id(), url = ?item.url()))]
    async fn fetch_content(&self, item: &IndexableItem) -> Result<String, EnrichmentError> {
        let url = item.url().ok_or(EnrichmentError::NoUrl)?;

        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;

        let text = self.extractor.extract(&body, self.config.max_content_chars);
        if text.is_empty() {
            return Err(EnrichmentError::EmptyBody);
        }

        debug!(chars = text.len(), "Fetched page content");
        Ok(text)
    }
}
