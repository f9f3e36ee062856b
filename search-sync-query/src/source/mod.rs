//! Content source seam.
//!
//! The content repository (element storage and its query objects) lives
//! outside this system; it is reached only through `ContentSource`.

mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::filter::FilterCriteria;
use search_sync_shared::{BatchJob, ContentRecord};

pub use memory::MemoryContentSource;

/// The content source could not answer a query.
///
/// Not retried here; a reindex run whose filter cannot be resolved does not
/// start.
#[derive(Debug, Clone, Error)]
pub enum QueryResolutionError {
    /// The source could not be reached.
    #[error("Content source unreachable: {0}")]
    Unreachable(String),

    /// The source was reached but the query failed.
    #[error("Content query failed: {0}")]
    QueryFailed(String),
}

impl QueryResolutionError {
    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::Unreachable(msg.into())
    }

    pub fn query_failed(msg: impl Into<String>) -> Self {
        Self::QueryFailed(msg.into())
    }
}

/// Abstract access to the content repository.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Number of items matching `criteria`, without enumerating them.
    async fn count(&self, criteria: &FilterCriteria) -> Result<u64, QueryResolutionError>;

    /// Identifiers of every item matching `criteria`, as indexing jobs.
    async fn find_jobs(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<Vec<BatchJob>, QueryResolutionError>;

    /// Load one item. `Ok(None)` when it no longer exists.
    async fn fetch(&self, job: &BatchJob) -> Result<Option<ContentRecord>, QueryResolutionError>;

    /// Items nested under `job` (variants, child entries) that need their
    /// own indexing job.
    async fn children(&self, job: &BatchJob) -> Result<Vec<BatchJob>, QueryResolutionError>;
}
