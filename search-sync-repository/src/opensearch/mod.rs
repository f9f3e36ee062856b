//! OpenSearch implementation of the search index client.
//!
//! This module provides a concrete implementation of `SearchIndexClient`
//! using OpenSearch as the backend.

mod client;
mod index_config;
mod queries;

pub use client::OpenSearchClient;
pub use index_config::get_index_settings;
pub use queries::build_search_query;
