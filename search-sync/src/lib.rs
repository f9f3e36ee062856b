//! # Search Sync
//!
//! Main library for content search sync.
//!
//! This crate provides configuration, dependency wiring and logging for the
//! `search-sync` binary.

pub mod config;
pub mod logging;
pub mod source;

pub use config::{Dependencies, Settings};

use thiserror::Error;

/// Errors that can occur while configuring or running a command.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] search_sync_pipeline::PipelineError),

    /// Search error.
    #[error("Search error: {0}")]
    SearchError(#[from] search_sync_repository::SearchError),

    /// Rate-limited or rejected search.
    #[error("Search service error: {0}")]
    SearchServiceError(#[from] search_sync_query::SearchServiceError),

    /// Index name rejected.
    #[error(transparent)]
    InvalidIndexName(#[from] search_sync_repository::IndexNameError),

    /// Content enrichment could not be set up.
    #[error("Enrichment error: {0}")]
    EnrichmentError(#[from] search_sync_pipeline::EnrichmentError),

    /// Content file could not be parsed.
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
