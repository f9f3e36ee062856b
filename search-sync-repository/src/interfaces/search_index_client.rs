//! Search index client trait definition.
//!
//! The indexing pipeline and the search service only need success/failure
//! signalling from the engine; everything wire-specific stays behind this
//! trait.

use async_trait::async_trait;

use crate::errors::SearchError;
use search_sync_shared::{IndexDocument, IndexStats, SearchQuery, SearchResponse};

/// Abstract interface for search engine operations.
///
/// Implementations can be swapped for different backends (OpenSearch, mock,
/// etc.) enabling easy testing.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
#[async_trait]
pub trait SearchIndexClient: Send + Sync {
    /// Index a single document.
    ///
    /// If a document with the same object id already exists, it is replaced.
    /// Implementations should bound the call with a timeout and report an
    /// expired timeout as an error.
    ///
    /// # Arguments
    ///
    /// * `document` - The document to index
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the document was indexed
    /// * `Err(SearchError)` - If indexing did not happen
    async fn index(&self, document: &IndexDocument) -> Result<(), SearchError>;

    /// Execute a search query, including its paging options.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let query = SearchQuery::new("winter boots").in_site(1).with_limit(10);
    /// let response = client.search(&query).await?;
    /// println!("Found {} results", response.total);
    /// ```
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError>;

    /// Check whether the search engine is reachable.
    async fn test_connection(&self) -> bool;

    /// Read document count and size for an index key.
    async fn get_stats(&self, index_key: &str) -> Result<IndexStats, SearchError>;
}
