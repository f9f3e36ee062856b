//! Remote progress endpoint.
//!
//! A remote caller (typically an admin UI) drives a run request by request:
//! `{"start": true, ...params}` resolves the filter and answers with the
//! first batches of jobs; each `{"continue": [jobs]}` runs those jobs and
//! answers with updated counters plus any follow-up batches they revealed.
//! One run is kept per caller; starting again abandons the previous one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument};

use search_sync_query::{ContentSource, FilterSettings, FrontendFetchPolicy};
use search_sync_shared::BatchJob;

use crate::errors::PipelineError;
use crate::job::{run_with_timeout, JobOutcome, JobReport, JobRunner};
use crate::orchestrator::{OrchestratorConfig, MAX_CONCURRENT_JOBS};
use crate::params::ReindexParams;
use crate::progress::ProgressSnapshot;
use crate::report::BatchReport;
use crate::run::{BatchRun, RunState};

/// A request from the remote caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequest {
    #[serde(default)]
    pub start: bool,
    #[serde(default, rename = "continue", skip_serializing_if = "Option::is_none")]
    pub continue_jobs: Option<Vec<BatchJob>>,
    #[serde(flatten)]
    pub params: ReindexParams,
}

impl ProgressRequest {
    pub fn start(params: ReindexParams) -> Self {
        Self {
            start: true,
            continue_jobs: None,
            params,
        }
    }

    pub fn continue_with(jobs: Vec<BatchJob>) -> Self {
        Self {
            start: false,
            continue_jobs: Some(jobs),
            params: ReindexParams::default(),
        }
    }
}

/// Outcome of one job in a `continue` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResult {
    pub element_id: u64,
    pub element_type: String,
    pub site_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub partial: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ItemResult {
    fn from_report(report: &JobReport) -> Self {
        let (error, partial, reason) = match &report.outcome {
            JobOutcome::Success => (None, false, None),
            JobOutcome::Partial { reason } => (None, true, Some(reason.clone())),
            JobOutcome::Failure { error } => (Some(error.clone()), false, None),
        };
        Self {
            element_id: report.job.item_id,
            element_type: report.job.type_name.clone(),
            site_id: report.job.site_id,
            error,
            partial,
            reason,
        }
    }

    fn rejected(job: &BatchJob, error: &str) -> Self {
        Self {
            element_id: job.item_id,
            element_type: job.type_name.clone(),
            site_id: job.site_id,
            error: Some(error.to_string()),
            partial: false,
            reason: None,
        }
    }
}

/// Counters after a request, plus newly handed-out batches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub run_id: String,
    pub state: RunState,
    pub completed_actions: u64,
    pub total_actions: u64,
    pub failed_actions: u64,
    pub partial_actions: u64,
    /// Batches of jobs the caller should send back with `continue`.
    pub entries: Vec<Vec<BatchJob>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<ItemResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
}

impl ProgressResponse {
    fn new(run: &BatchRun, entries: Vec<Vec<BatchJob>>, results: Vec<ItemResult>, now: Instant) -> Self {
        let snapshot = run.snapshot(now);
        Self {
            run_id: snapshot.run_id,
            state: snapshot.state,
            completed_actions: snapshot.completed_actions,
            total_actions: snapshot.total_actions,
            failed_actions: snapshot.failed_actions,
            partial_actions: snapshot.partial_actions,
            entries,
            results,
            eta: snapshot.eta,
        }
    }
}

struct CallerRun {
    run: Arc<Mutex<BatchRun>>,
    permits: Arc<Semaphore>,
    /// Decided once at start from the global switch and the request's opt-in.
    frontend_fetch: FrontendFetchPolicy,
}

/// Serves progress requests, one active run per caller.
pub struct BatchEndpoint {
    source: Arc<dyn ContentSource>,
    runner: Arc<dyn JobRunner>,
    settings: FilterSettings,
    config: OrchestratorConfig,
    runs: Mutex<HashMap<String, CallerRun>>,
}

impl BatchEndpoint {
    pub fn new(
        source: Arc<dyn ContentSource>,
        runner: Arc<dyn JobRunner>,
        settings: FilterSettings,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            source,
            runner,
            settings,
            config,
            runs: Mutex::new(HashMap::new()),
        }
    }

    /// Handle one request from `caller`.
    #[instrument(skip(self, request), fields(caller = %caller, start = request.start))]
    pub async fn handle(
        &self,
        caller: &str,
        request: ProgressRequest,
    ) -> Result<ProgressResponse, PipelineError> {
        if request.start {
            return self.start(caller, &request.params).await;
        }
        match request.continue_jobs {
            Some(jobs) => self.continue_run(caller, jobs).await,
            None => Err(PipelineError::validation(
                "Request must carry `start` or `continue`",
            )),
        }
    }

    pub fn snapshot(&self, caller: &str) -> Option<ProgressSnapshot> {
        let runs = self.runs.lock();
        let entry = runs.get(caller)?;
        let snapshot = entry.run.lock().snapshot(Instant::now());
        Some(snapshot)
    }

    pub fn report(&self, caller: &str) -> Option<BatchReport> {
        let runs = self.runs.lock();
        let entry = runs.get(caller)?;
        let report = entry.run.lock().report(Instant::now());
        Some(report)
    }

    /// Abandon and forget `caller`'s run. Returns whether there was one.
    pub fn abandon(&self, caller: &str) -> bool {
        match self.runs.lock().remove(caller) {
            Some(previous) => {
                previous.run.lock().abandon();
                previous.permits.close();
                true
            }
            None => false,
        }
    }

    async fn start(
        &self,
        caller: &str,
        params: &ReindexParams,
    ) -> Result<ProgressResponse, PipelineError> {
        let builder = params.to_builder(self.settings.clone());
        let seed = builder.resolve(self.source.as_ref()).await?;
        let frontend_fetch = builder.frontend_fetch_policy();

        let now = Instant::now();
        let mut run = BatchRun::new(seed, run_cap(&self.config), now);
        run.start(now);
        let entries = run.hand_out(self.config.hand_out_batch_size);
        let response = ProgressResponse::new(&run, entries, Vec::new(), now);

        self.abandon(caller);
        self.runs.lock().insert(
            caller.to_string(),
            CallerRun {
                run: Arc::new(Mutex::new(run)),
                permits: Arc::new(Semaphore::new(run_cap(&self.config))),
                frontend_fetch: frontend_fetch.clone(),
            },
        );

        info!(
            run_id = %response.run_id,
            total = response.total_actions,
            frontend_fetch = frontend_fetch.is_enabled(),
            "Remote batch run started"
        );
        Ok(response)
    }

    async fn continue_run(
        &self,
        caller: &str,
        jobs: Vec<BatchJob>,
    ) -> Result<ProgressResponse, PipelineError> {
        let (run, permits, frontend_fetch) = {
            let runs = self.runs.lock();
            let entry = runs
                .get(caller)
                .ok_or_else(|| PipelineError::validation("No active batch run for caller"))?;
            (entry.run.clone(), entry.permits.clone(), entry.frontend_fetch.clone())
        };

        let results = futures::future::join_all(
            jobs.into_iter()
                .map(|job| self.run_one(&run, &permits, &frontend_fetch, job)),
        )
        .await;

        let now = Instant::now();
        let mut run = run.lock();
        let entries = run.hand_out(self.config.hand_out_batch_size);
        debug!(
            results = results.len(),
            follow_up_batches = entries.len(),
            state = %run.state(),
            "Continue request handled"
        );
        Ok(ProgressResponse::new(&run, entries, results, now))
    }

    async fn run_one(
        &self,
        run: &Mutex<BatchRun>,
        permits: &Semaphore,
        frontend_fetch: &FrontendFetchPolicy,
        job: BatchJob,
    ) -> ItemResult {
        let Ok(_permit) = permits.acquire().await else {
            return ItemResult::rejected(&job, "Batch run was abandoned");
        };

        let claimed = run.lock().claim(&job);
        let Some(dispatch) = claimed else {
            return ItemResult::rejected(&job, "Job is not part of the active batch run");
        };

        let report = run_with_timeout(
            self.runner.clone(),
            dispatch.job,
            frontend_fetch.clone(),
            self.config.job_timeout,
        )
        .await;
        run.lock().complete(dispatch.ticket, &report, Instant::now());
        ItemResult::from_report(&report)
    }
}

fn run_cap(config: &OrchestratorConfig) -> usize {
    config.max_concurrent.clamp(1, MAX_CONCURRENT_JOBS)
}
