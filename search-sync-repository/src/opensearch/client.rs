//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchIndexClient`
//! using the OpenSearch Rust client. Documents are written to one index per
//! site/type pair, named `{prefix}_{site}_{type}`.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use opensearch::{
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts, IndicesStatsParts},
    IndexParts, OpenSearch, SearchParts,
};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::errors::SearchError;
use crate::index_name::{compose_index_name, IndexNameValidator};
use crate::interfaces::SearchIndexClient;
use crate::opensearch::index_config::get_index_settings;
use crate::opensearch::queries::build_search_query;
use search_sync_shared::{IndexDocument, IndexStats, SearchHit, SearchQuery, SearchResponse};

/// Default timeout applied to every request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// OpenSearch client implementation.
///
/// # Example
///
/// ```ignore
/// let client = OpenSearchClient::new("http://localhost:9200", "craft").await?;
/// client.index(&document).await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
    index_prefix: String,
    timeout: Duration,
    ensured_indexes: Mutex<HashSet<String>>,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_prefix` - Prefix of every index this client writes to
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchError)` - If connection setup fails
    pub async fn new(url: &str, index_prefix: &str) -> Result<Self, SearchError> {
        Self::with_timeout(url, index_prefix, DEFAULT_REQUEST_TIMEOUT).await
    }

    /// Create a client with a custom per-request timeout.
    pub async fn with_timeout(
        url: &str,
        index_prefix: &str,
        timeout: Duration,
    ) -> Result<Self, SearchError> {
        let parsed_url = Url::parse(url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);
        let index_prefix = IndexNameValidator::sanitize(index_prefix);

        info!(
            url = %url,
            index_prefix = %index_prefix,
            timeout_secs = timeout.as_secs(),
            "Created OpenSearch client"
        );

        Ok(Self {
            client,
            index_prefix,
            timeout,
            ensured_indexes: Mutex::new(HashSet::new()),
        })
    }

    /// Name of the index a document belongs in.
    pub fn index_for(&self, site_id: u64, type_name: &str) -> String {
        compose_index_name(&self.index_prefix, site_id, type_name)
    }

    async fn send<T, F>(&self, request: F) -> Result<T, SearchError>
    where
        F: Future<Output = Result<T, opensearch::Error>>,
    {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result.map_err(|e| SearchError::connection(e.to_string())),
            Err(_) => Err(SearchError::Timeout(self.timeout.as_secs())),
        }
    }

    /// Create the index with our mappings unless we already know it exists.
    async fn ensure_index(&self, index: &str) -> Result<(), SearchError> {
        if self.ensured_indexes.lock().await.contains(index) {
            return Ok(());
        }

        let exists = self
            .send(
                self.client
                    .indices()
                    .exists(IndicesExistsParts::Index(&[index]))
                    .send(),
            )
            .await?;

        if !exists.status_code().is_success() {
            let response = self
                .send(
                    self.client
                        .indices()
                        .create(IndicesCreateParts::Index(index))
                        .body(get_index_settings())
                        .send(),
                )
                .await?;

            let status = response.status_code();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                // Another writer may have created it in the meantime.
                if !body.contains("resource_already_exists_exception") {
                    error!(index = %index, status = %status, body = %body, "Index creation failed");
                    return Err(SearchError::IndexCreationError(format!(
                        "Creating {} failed with status {}: {}",
                        index, status, body
                    )));
                }
            } else {
                info!(index = %index, "Created search index");
            }
        }

        self.ensured_indexes.lock().await.insert(index.to_string());
        Ok(())
    }

    /// Convert an OpenSearch hit to a `SearchHit`.
    fn parse_hit(hit: &Value) -> Option<SearchHit> {
        let source = hit.get("_source")?;
        Some(SearchHit {
            object_id: source.get("objectId")?.as_str()?.to_string(),
            item_id: source.get("itemId")?.as_u64()?,
            site_id: source.get("siteId")?.as_u64()?,
            type_name: source.get("typeName")?.as_str()?.to_string(),
            title: source
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            url: source.get("url").and_then(Value::as_str).map(String::from),
            score: hit.get("_score").and_then(Value::as_f64).unwrap_or(0.0),
        })
    }

    fn parse_search_response(body: &Value) -> SearchResponse {
        let hits = body["hits"]["hits"]
            .as_array()
            .map(|hits| hits.iter().filter_map(Self::parse_hit).collect())
            .unwrap_or_default();

        SearchResponse {
            hits,
            total: body["hits"]["total"]["value"].as_u64().unwrap_or(0),
            took_ms: body["took"].as_u64().unwrap_or(0),
        }
    }
}

#[async_trait]
impl SearchIndexClient for OpenSearchClient {
    #[instrument(skip(self, document), fields(object_id = %document.object_id))]
    async fn index(&self, document: &IndexDocument) -> Result<(), SearchError> {
        let index = self.index_for(document.site_id, &document.type_name);
        self.ensure_index(&index).await?;

        let response = self
            .send(
                self.client
                    .index(IndexParts::IndexId(&index, &document.object_id))
                    .body(document)
                    .send(),
            )
            .await
            .map_err(|e| match e {
                SearchError::ConnectionError(msg) => SearchError::index(msg),
                other => other,
            })?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Index request failed");
            return Err(SearchError::index(format!(
                "Index failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(index = %index, "Document indexed");
        Ok(())
    }

    #[instrument(skip(self, query), fields(query = %query.query))]
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        let target = match &query.index_key {
            Some(index_key) => {
                IndexNameValidator::ensure_valid(index_key)?;
                index_key.clone()
            }
            None => format!("{}_*", self.index_prefix),
        };

        let response = self
            .send(
                self.client
                    .search(SearchParts::Index(&[target.as_str()]))
                    .from(query.offset as i64)
                    .size(query.limit as i64)
                    .body(build_search_query(query))
                    .send(),
            )
            .await?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(SearchError::query(format!(
                "Search failed with status {}: {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        Ok(Self::parse_search_response(&body))
    }

    async fn test_connection(&self) -> bool {
        match self.send(self.client.ping().send()).await {
            Ok(response) => response.status_code().is_success(),
            Err(e) => {
                debug!(error = %e, "Ping failed");
                false
            }
        }
    }

    #[instrument(skip(self))]
    async fn get_stats(&self, index_key: &str) -> Result<IndexStats, SearchError> {
        IndexNameValidator::ensure_valid(index_key)?;

        let response = self
            .send(
                self.client
                    .indices()
                    .stats(IndicesStatsParts::Index(&[index_key]))
                    .send(),
            )
            .await?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(SearchError::stats(format!(
                "Stats failed with status {}: {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;
        let primaries = &body["_all"]["primaries"];

        Ok(IndexStats {
            index: index_key.to_string(),
            document_count: primaries["docs"]["count"].as_u64().unwrap_or(0),
            size_bytes: primaries["store"]["size_in_bytes"].as_u64().unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_hit() {
        let hit = json!({
            "_source": {
                "objectId": "entry_1_42",
                "itemId": 42,
                "siteId": 1,
                "typeName": "entry",
                "title": "Winter boots",
                "url": "https://example.com/boots"
            },
            "_score": 1.5
        });

        let result = OpenSearchClient::parse_hit(&hit).unwrap();

        assert_eq!(result.item_id, 42);
        assert_eq!(result.title, "Winter boots");
        assert_eq!(result.url.as_deref(), Some("https://example.com/boots"));
        assert_eq!(result.score, 1.5);
    }

    #[test]
    fn test_parse_hit_minimal() {
        let hit = json!({
            "_source": {
                "objectId": "asset_1_7",
                "itemId": 7,
                "siteId": 1,
                "typeName": "asset"
            },
            "_score": 0.5
        });

        let result = OpenSearchClient::parse_hit(&hit).unwrap();
        assert_eq!(result.title, "");
        assert!(result.url.is_none());
    }

    #[test]
    fn test_parse_hit_invalid() {
        let hit = json!({ "_source": { "title": "Missing IDs" }, "_score": 1.0 });
        assert!(OpenSearchClient::parse_hit(&hit).is_none());
    }

    #[test]
    fn test_parse_search_response() {
        let body = json!({
            "took": 4,
            "hits": {
                "total": { "value": 1 },
                "hits": [{
                    "_source": { "objectId": "entry_1_1", "itemId": 1, "siteId": 1, "typeName": "entry", "title": "A" },
                    "_score": 2.0
                }]
            }
        });

        let response = OpenSearchClient::parse_search_response(&body);
        assert_eq!(response.total, 1);
        assert_eq!(response.took_ms, 4);
        assert_eq!(response.hits.len(), 1);
    }

    #[tokio::test]
    async fn test_index_for_uses_sanitized_prefix() {
        let client = OpenSearchClient::new("http://localhost:9200", "My Site")
            .await
            .unwrap();
        assert_eq!(client.index_for(2, "entry"), "my-site_2_entry");
    }
}
