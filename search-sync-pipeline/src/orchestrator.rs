//! Orchestrator for reindex runs.
//!
//! Drives one `BatchRun` to completion: dispatches up to `max_concurrent`
//! jobs onto tasks, resumes on each completion, queues discovered follow-ups
//! and publishes a progress snapshot after every transition.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, watch};
use tracing::{info, instrument, warn};

use search_sync_query::{ContentSource, FrontendFetchPolicy, QueryFilterBuilder};
use search_sync_shared::BatchJob;

use crate::errors::PipelineError;
use crate::job::{run_with_timeout, JobReport, JobRunner};
use crate::progress::ProgressSnapshot;
use crate::report::BatchReport;
use crate::run::BatchRun;

/// Jobs in flight at once.
pub const MAX_CONCURRENT_JOBS: usize = 3;

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum number of jobs in flight, capped at `MAX_CONCURRENT_JOBS`.
    pub max_concurrent: usize,
    /// Upper bound on a single job; expiry counts as a failure.
    pub job_timeout: Duration,
    /// Jobs per batch handed to a remote caller.
    pub hand_out_batch_size: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: MAX_CONCURRENT_JOBS,
            job_timeout: Duration::from_secs(120),
            hand_out_batch_size: 10,
        }
    }
}

/// Lets another task abandon the orchestrator's current run.
#[derive(Debug, Clone)]
pub struct AbandonHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl AbandonHandle {
    pub fn abandon(&self) {
        self.tx.send_replace(true);
    }
}

/// Orchestrator that runs reindex batches.
///
/// The orchestrator:
/// - Keeps at most `max_concurrent` jobs in flight
/// - Grows the run's total as jobs discover follow-ups
/// - Publishes a `ProgressSnapshot` after every completion
/// - Stops on abandonment, discarding results still in flight
pub struct ReindexOrchestrator {
    runner: Arc<dyn JobRunner>,
    config: OrchestratorConfig,
    progress_tx: watch::Sender<ProgressSnapshot>,
    abandon_tx: Arc<watch::Sender<bool>>,
}

impl ReindexOrchestrator {
    /// Create a new orchestrator with the given runner.
    pub fn new(runner: Arc<dyn JobRunner>) -> Self {
        Self::with_config(runner, OrchestratorConfig::default())
    }

    /// Create a new orchestrator with custom configuration.
    pub fn with_config(runner: Arc<dyn JobRunner>, config: OrchestratorConfig) -> Self {
        let (progress_tx, _) = watch::channel(ProgressSnapshot::default());
        let (abandon_tx, _) = watch::channel(false);

        Self {
            runner,
            config,
            progress_tx,
            abandon_tx: Arc::new(abandon_tx),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Progress of the current (or last) run.
    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.progress_tx.subscribe()
    }

    pub fn abandon_handle(&self) -> AbandonHandle {
        AbandonHandle {
            tx: self.abandon_tx.clone(),
        }
    }

    /// Resolve `builder` against `source` and run the result with the
    /// builder's frontend-fetch decision.
    ///
    /// A resolution failure aborts before the run starts.
    #[instrument(skip(self, builder, source))]
    pub async fn start_from_filter(
        &mut self,
        builder: &QueryFilterBuilder,
        source: &dyn ContentSource,
    ) -> Result<BatchReport, PipelineError> {
        let seed = builder.resolve(source).await?;
        self.run_with(seed, builder.frontend_fetch_policy()).await
    }

    /// Run `seed` without frontend fetching.
    pub async fn run(&mut self, seed: Vec<BatchJob>) -> Result<BatchReport, PipelineError> {
        self.run_with(seed, FrontendFetchPolicy::disabled()).await
    }

    /// Run `seed` and everything it discovers to completion.
    ///
    /// Starting a run resets any earlier abandonment.
    #[instrument(
        skip(self, seed, frontend_fetch),
        fields(seed = seed.len(), frontend_fetch = frontend_fetch.is_enabled())
    )]
    pub async fn run_with(
        &mut self,
        seed: Vec<BatchJob>,
        frontend_fetch: FrontendFetchPolicy,
    ) -> Result<BatchReport, PipelineError> {
        self.abandon_tx.send_replace(false);
        let mut abandon_rx = self.abandon_tx.subscribe();

        let now = Instant::now();
        let mut run = BatchRun::new(seed, self.config.max_concurrent, now);
        run.start(now);

        let (tx, mut rx) = mpsc::channel::<(u64, JobReport)>(self.config.max_concurrent.max(1));
        self.dispatch(&mut run, &tx, &frontend_fetch);
        self.publish(&run);

        while !run.is_done() {
            tokio::select! {
                completion = rx.recv() => {
                    let Some((ticket, report)) = completion else {
                        warn!(run_id = %run.id(), "Completion channel closed");
                        break;
                    };
                    run.complete(ticket, &report, Instant::now());
                    self.dispatch(&mut run, &tx, &frontend_fetch);
                    self.publish(&run);
                }
                changed = abandon_rx.changed() => {
                    if changed.is_ok() && *abandon_rx.borrow_and_update() {
                        run.abandon();
                        self.publish(&run);
                        return Err(PipelineError::Abandoned(run.id().to_string()));
                    }
                }
            }
        }

        let report = run.report(Instant::now());
        info!(
            run_id = %report.run_id,
            total = report.total_actions,
            failed = report.failed_actions,
            partial = report.partial_actions,
            elapsed_secs = report.elapsed_secs,
            "Reindex run complete"
        );
        Ok(report)
    }

    fn dispatch(
        &self,
        run: &mut BatchRun,
        tx: &mpsc::Sender<(u64, JobReport)>,
        frontend_fetch: &FrontendFetchPolicy,
    ) {
        for dispatch in run.dispatch_ready() {
            let runner = self.runner.clone();
            let tx = tx.clone();
            let timeout = self.config.job_timeout;
            let frontend_fetch = frontend_fetch.clone();

            tokio::spawn(async move {
                let report = run_with_timeout(runner, dispatch.job, frontend_fetch, timeout).await;
                // the run may be gone; its results are then discarded
                let _ = tx.send((dispatch.ticket, report)).await;
            });
        }
    }

    fn publish(&self, run: &BatchRun) {
        self.progress_tx.send_replace(run.snapshot(Instant::now()));
    }
}
