//! Error types for the indexing pipeline.

use search_sync_query::QueryResolutionError;
use search_sync_repository::SearchError;
use thiserror::Error;

/// Raw content could not be turned into an `IndexableItem`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid item data in `{field}`: {reason}")]
pub struct InvalidItemDataError {
    /// The offending input field (`typeName`, `elementId`, `siteId`, ...).
    pub field: String,
    pub reason: String,
}

impl InvalidItemDataError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Fetching rendered content for an item failed.
#[derive(Error, Debug)]
pub enum EnrichmentError {
    /// The item has no frontend URL to fetch.
    #[error("Item has no URL")]
    NoUrl,

    /// The request could not be sent or its body not read.
    #[error("Request error: {0}")]
    RequestError(String),

    /// The page answered with a non-success status.
    #[error("Unexpected status {0}")]
    Status(u16),

    /// The page held no extractable text.
    #[error("Page has no text content")]
    EmptyBody,

    /// The fetcher could not be configured.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl EnrichmentError {
    /// Create a request error.
    pub fn request(msg: impl Into<String>) -> Self {
        Self::RequestError(msg.into())
    }

    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }
}

impl From<reqwest::Error> for EnrichmentError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::Status(status.as_u16()),
            None => Self::RequestError(err.to_string()),
        }
    }
}

/// Run-level errors. Failures of individual jobs never surface here.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The filter could not be resolved; the run does not start.
    #[error("Query resolution error: {0}")]
    QueryResolution(#[from] QueryResolutionError),

    /// The request was malformed.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A component was misconfigured.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Error from the search engine outside of a job.
    #[error("Search error: {0}")]
    SearchError(#[from] SearchError),

    /// The run was abandoned by its caller.
    #[error("Batch run {0} was abandoned")]
    Abandoned(String),
}

impl PipelineError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }
}
