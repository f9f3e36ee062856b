//! A single unit of indexing work.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, instrument, warn};

use search_sync_query::{ContentSource, FrontendFetchPolicy};
use search_sync_repository::SearchIndexClient;
use search_sync_shared::BatchJob;

use crate::enrichment::ContentEnricher;
use crate::factory::IndexableItemFactory;

/// How one job ended. Exactly one per dispatched job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Indexed with full content.
    Success,
    /// Indexed as a minimal document; the item is searchable but degraded.
    Partial { reason: String },
    /// Nothing was indexed.
    Failure { error: String },
}

impl JobOutcome {
    pub fn partial(reason: impl Into<String>) -> Self {
        Self::Partial {
            reason: reason.into(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Partial { reason } => write!(f, "partial ({reason})"),
            Self::Failure { error } => write!(f, "failure ({error})"),
        }
    }
}

/// Result of running one job, with any work it discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub job: BatchJob,
    pub outcome: JobOutcome,
    /// Jobs revealed by this one (child items), to be queued by the run.
    pub follow_ups: Vec<BatchJob>,
}

impl JobReport {
    pub fn new(job: BatchJob, outcome: JobOutcome) -> Self {
        Self {
            job,
            outcome,
            follow_ups: Vec::new(),
        }
    }

    pub fn with_follow_ups(mut self, follow_ups: Vec<BatchJob>) -> Self {
        self.follow_ups = follow_ups;
        self
    }
}

/// Executes jobs for the orchestrator and the batch endpoint.
///
/// # Thread Safety
///
/// Runners are shared across spawned tasks and must be `Send + Sync`.
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Run one job to an outcome. Never fails: errors become `Failure`.
    ///
    /// # Arguments
    ///
    /// * `job` - The item to index
    /// * `frontend_fetch` - The run's resolved frontend-fetch decision
    async fn run(&self, job: &BatchJob, frontend_fetch: &FrontendFetchPolicy) -> JobReport;
}

/// What an index job needs from the outside.
#[derive(Clone)]
pub struct IndexJobContext {
    pub source: Arc<dyn ContentSource>,
    pub client: Arc<dyn SearchIndexClient>,
    pub factory: Arc<IndexableItemFactory>,
    pub enricher: Option<Arc<dyn ContentEnricher>>,
    /// Queue child items of each indexed item as follow-up jobs.
    pub discover_children: bool,
}

impl fmt::Debug for IndexJobContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexJobContext")
            .field("has_enricher", &self.enricher.is_some())
            .field("discover_children", &self.discover_children)
            .finish_non_exhaustive()
    }
}

/// One attempt at indexing one item on one site. No internal retry.
#[derive(Debug, Clone)]
pub struct IndexJob {
    job: BatchJob,
}

impl IndexJob {
    pub fn new(job: BatchJob) -> Self {
        Self { job }
    }

    /// Fetch, transform and index the item.
    ///
    /// Enrichment runs only when `frontend_fetch` applies to the item's type.
    #[instrument(
        skip(self, ctx, frontend_fetch),
        fields(item_id = self.job.item_id, site_id = self.job.site_id, type_name = %self.job.type_name)
    )]
    pub async fn execute(
        &self,
        ctx: &IndexJobContext,
        frontend_fetch: &FrontendFetchPolicy,
    ) -> JobReport {
        let job = self.job.clone();

        let record = match ctx.source.fetch(&job).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                return JobReport::new(job, JobOutcome::failure("Item not found in content source"))
            }
            Err(e) => return JobReport::new(job, JobOutcome::failure(e.to_string())),
        };

        let item = match ctx.factory.create_from_source_object(&record) {
            Ok(item) => item,
            Err(e) => return JobReport::new(job, JobOutcome::failure(e.to_string())),
        };

        let follow_ups = if ctx.discover_children {
            ctx.source.children(&job).await.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to discover child items");
                Vec::new()
            })
        } else {
            Vec::new()
        };

        let now = Utc::now();
        let (document, outcome) = match &ctx.enricher {
            Some(enricher) if frontend_fetch.applies_to([item.type_name()]) => {
                match enricher.fetch_content(&item).await {
                    Ok(content) => (item.to_document(Some(content), now), JobOutcome::Success),
                    Err(e) => {
                        warn!(error = %e, "Content fetch failed, indexing minimal document");
                        (
                            item.to_minimal_document(now),
                            JobOutcome::partial(format!("Content fetch failed: {e}")),
                        )
                    }
                }
            }
            _ => (item.to_document(None, now), JobOutcome::Success),
        };

        if let Err(e) = ctx.client.index(&document).await {
            error!(error = %e, "Failed to index item");
            return JobReport::new(job, JobOutcome::failure(e.to_string()));
        }

        debug!(outcome = %outcome, follow_ups = follow_ups.len(), "Indexed item");
        JobReport::new(job, outcome).with_follow_ups(follow_ups)
    }
}

/// `JobRunner` that runs `IndexJob`s.
#[derive(Debug, Clone)]
pub struct IndexJobRunner {
    ctx: IndexJobContext,
}

impl IndexJobRunner {
    pub fn new(ctx: IndexJobContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl JobRunner for IndexJobRunner {
    async fn run(&self, job: &BatchJob, frontend_fetch: &FrontendFetchPolicy) -> JobReport {
        IndexJob::new(job.clone()).execute(&self.ctx, frontend_fetch).await
    }
}

/// Run `job` on its own task, bounded by `timeout`.
///
/// A timed-out or panicking job is reported as a failure; the task is
/// aborted on timeout.
pub async fn run_with_timeout(
    runner: Arc<dyn JobRunner>,
    job: BatchJob,
    frontend_fetch: FrontendFetchPolicy,
    timeout: Duration,
) -> JobReport {
    let task_job = job.clone();
    let mut handle = tokio::spawn(async move { runner.run(&task_job, &frontend_fetch).await });

    match tokio::time::timeout(timeout, &mut handle).await {
        Ok(Ok(report)) => report,
        Ok(Err(e)) => {
            error!(item_id = job.item_id, error = %e, "Index job task failed");
            JobReport::new(job, JobOutcome::failure(format!("Job aborted: {e}")))
        }
        Err(_) => {
            handle.abort();
            warn!(item_id = job.item_id, timeout_secs = timeout.as_secs(), "Index job timed out");
            JobReport::new(
                job,
                JobOutcome::failure(format!("Timed out after {}s", timeout.as_secs())),
            )
        }
    }
}
