//! # Search Sync Repository
//!
//! This crate provides the interface to the search engine and the naming
//! contract for its indexes. It includes definitions for errors, the
//! `SearchIndexClient` trait, index-name validation and a concrete
//! implementation for OpenSearch.

pub mod errors;
pub mod index_name;
pub mod interfaces;
pub mod opensearch;

pub use errors::{IndexNameError, SearchError};
pub use index_name::{compose_index_name, IndexNameValidator, IndexNameViolation};
pub use interfaces::SearchIndexClient;
pub use opensearch::OpenSearchClient;
