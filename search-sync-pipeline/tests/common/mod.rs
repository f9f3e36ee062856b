//! Scripted job runner and mock collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use search_sync_pipeline::{
    ContentEnricher, EnrichmentError, IndexableItem, JobOutcome, JobReport, JobRunner,
};
use search_sync_query::FrontendFetchPolicy;
use search_sync_repository::{SearchError, SearchIndexClient};
use search_sync_shared::{BatchJob, IndexDocument, IndexStats, SearchQuery, SearchResponse};

/// What the runner does for one item id.
#[derive(Debug, Clone)]
pub struct Script {
    pub outcome: JobOutcome,
    pub follow_ups: Vec<BatchJob>,
    pub delay: Duration,
}

impl Script {
    pub fn ok() -> Self {
        Self {
            outcome: JobOutcome::Success,
            follow_ups: Vec::new(),
            delay: Duration::from_millis(10),
        }
    }

    pub fn outcome(mut self, outcome: JobOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn follow_ups(mut self, follow_ups: Vec<BatchJob>) -> Self {
        self.follow_ups = follow_ups;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Runner that plays back scripts and records peak concurrency.
pub struct ScriptedRunner {
    scripts: HashMap<u64, Script>,
    running: AtomicUsize,
    pub peak: AtomicUsize,
    pub runs: AtomicUsize,
    /// Runs that were allowed to fetch frontend content.
    pub fetching: AtomicUsize,
}

impl ScriptedRunner {
    pub fn new(scripts: HashMap<u64, Script>) -> Self {
        Self {
            scripts,
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            runs: AtomicUsize::new(0),
            fetching: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl JobRunner for ScriptedRunner {
    async fn run(&self, job: &BatchJob, frontend_fetch: &FrontendFetchPolicy) -> JobReport {
        let now_running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now_running, Ordering::SeqCst);
        self.runs.fetch_add(1, Ordering::SeqCst);
        if frontend_fetch.is_enabled() {
            self.fetching.fetch_add(1, Ordering::SeqCst);
        }

        let script = self.scripts.get(&job.item_id).cloned().unwrap_or_else(Script::ok);
        tokio::time::sleep(script.delay).await;

        self.running.fetch_sub(1, Ordering::SeqCst);
        JobReport::new(job.clone(), script.outcome).with_follow_ups(script.follow_ups)
    }
}

pub fn entry(id: u64) -> BatchJob {
    BatchJob::new(id, 1, "entry")
}

/// Search client that accepts every document and counts them.
#[derive(Default)]
pub struct RecordingClient {
    pub indexed: AtomicUsize,
}

#[async_trait]
impl SearchIndexClient for RecordingClient {
    async fn index(&self, _document: &IndexDocument) -> Result<(), SearchError> {
        self.indexed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn search(&self, _query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        Ok(SearchResponse::empty())
    }

    async fn test_connection(&self) -> bool {
        true
    }

    async fn get_stats(&self, index_key: &str) -> Result<IndexStats, SearchError> {
        Ok(IndexStats {
            index: index_key.to_string(),
            document_count: 0,
            size_bytes: 0,
        })
    }
}

/// Enricher that counts fetches and always succeeds.
#[derive(Default)]
pub struct CountingEnricher {
    pub calls: AtomicUsize,
}

#[async_trait]
impl ContentEnricher for CountingEnricher {
    async fn fetch_content(&self, _item: &IndexableItem) -> Result<String, EnrichmentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("page text".to_string())
    }
}
