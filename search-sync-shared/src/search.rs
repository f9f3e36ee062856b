//! Search request and response types.

use serde::{Deserialize, Serialize};

/// Default number of hits per page.
pub const DEFAULT_LIMIT: usize = 20;

/// A search query with its paging options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub query: String,
    /// Index to search; `None` searches every index under the configured prefix.
    #[serde(default)]
    pub index_key: Option<String>,
    #[serde(default)]
    pub site_id: Option<u64>,
    #[serde(default)]
    pub type_names: Vec<String>,
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            index_key: None,
            site_id: None,
            type_names: Vec::new(),
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }

    pub fn in_index(mut self, index_key: impl Into<String>) -> Self {
        self.index_key = Some(index_key.into());
        self
    }

    pub fn in_site(mut self, site_id: u64) -> Self {
        self.site_id = Some(site_id);
        self
    }

    pub fn of_types<I, S>(mut self, type_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_names = type_names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub object_id: String,
    pub item_id: u64,
    pub site_id: u64,
    pub type_name: String,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    pub score: f64,
}

/// Search results with metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
    pub total: u64,
    pub took_ms: u64,
}

impl SearchResponse {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Document count and storage size of one index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub index: String,
    pub document_count: u64,
    pub size_bytes: u64,
}
