//! The batch-run state machine.
//!
//! A run moves `Idle -> Running -> Draining -> Done`. It owns the pending
//! queue and the `BatchProgress`; transitions happen through `start`,
//! `next_dispatch`/`claim` and `complete`. Jobs leave the queue either as
//! local dispatches (tickets) or as hand-outs to a remote caller, which turn
//! into tickets when claimed.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use search_sync_shared::BatchJob;

use crate::job::JobReport;
use crate::orchestrator::MAX_CONCURRENT_JOBS;
use crate::progress::{BatchProgress, ProgressSnapshot};
use crate::report::BatchReport;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    /// Nothing left to dispatch; waiting on jobs in flight.
    Draining,
    Done,
    /// The caller walked away; late completions are ignored.
    Abandoned,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Abandoned)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Done => "done",
            Self::Abandoned => "abandoned",
        };
        f.write_str(name)
    }
}

/// A job handed to a worker, identified by its ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub ticket: u64,
    pub job: BatchJob,
}

/// One reindex run.
#[derive(Debug)]
pub struct BatchRun {
    id: Uuid,
    state: RunState,
    max_concurrent: usize,
    pending: VecDeque<BatchJob>,
    in_flight: HashMap<u64, BatchJob>,
    handed_out: HashMap<BatchJob, usize>,
    next_ticket: u64,
    progress: BatchProgress,
    started_at: Instant,
}

impl BatchRun {
    pub fn new(seed: Vec<BatchJob>, max_concurrent: usize, now: Instant) -> Self {
        let total = seed.len() as u64;
        Self {
            id: Uuid::new_v4(),
            state: RunState::Idle,
            max_concurrent: max_concurrent.clamp(1, MAX_CONCURRENT_JOBS),
            pending: seed.into(),
            in_flight: HashMap::new(),
            handed_out: HashMap::new(),
            next_ticket: 0,
            progress: BatchProgress::new(total, now),
            started_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn progress(&self) -> &BatchProgress {
        &self.progress
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_done(&self) -> bool {
        self.state == RunState::Done
    }

    /// `Idle -> Running`; an empty run goes straight to `Done`.
    pub fn start(&mut self, now: Instant) {
        if self.state != RunState::Idle {
            return;
        }
        self.started_at = now;
        self.progress = BatchProgress::new(self.pending.len() as u64, now);
        self.state = RunState::Running;
        info!(run_id = %self.id, total = self.progress.total_actions, "Batch run started");
        self.settle();
    }

    /// Take the next job if the concurrency cap allows.
    pub fn next_dispatch(&mut self) -> Option<Dispatch> {
        if self.state != RunState::Running || self.progress.loading_actions >= self.max_concurrent {
            return None;
        }
        let job = self.pending.pop_front()?;
        let dispatch = self.track(job);
        self.settle();
        Some(dispatch)
    }

    /// Every dispatch the cap currently allows.
    pub fn dispatch_ready(&mut self) -> Vec<Dispatch> {
        std::iter::from_fn(|| self.next_dispatch()).collect()
    }

    /// Move all pending jobs out to a remote caller, in batches of
    /// `batch_size`. They count as outstanding until claimed and completed.
    pub fn hand_out(&mut self, batch_size: usize) -> Vec<Vec<BatchJob>> {
        if self.state != RunState::Running {
            return Vec::new();
        }
        let jobs: Vec<BatchJob> = self.pending.drain(..).collect();
        for job in &jobs {
            *self.handed_out.entry(job.clone()).or_insert(0) += 1;
        }
        self.settle();
        jobs.chunks(batch_size.max(1)).map(<[BatchJob]>::to_vec).collect()
    }

    /// Turn a handed-out job into a dispatch. `None` if the job was not
    /// handed out by this run, or the cap is reached.
    pub fn claim(&mut self, job: &BatchJob) -> Option<Dispatch> {
        if self.state.is_terminal() || self.progress.loading_actions >= self.max_concurrent {
            return None;
        }
        let count = self.handed_out.get_mut(job)?;
        *count -= 1;
        if *count == 0 {
            self.handed_out.remove(job);
        }
        Some(self.track(job.clone()))
    }

    /// Record a finished job. Returns `false` when the completion was
    /// ignored: unknown ticket, or the run is already over.
    pub fn complete(&mut self, ticket: u64, report: &JobReport, now: Instant) -> bool {
        if self.state.is_terminal() {
            debug!(run_id = %self.id, ticket, "Ignoring completion for finished run");
            return false;
        }
        if self.in_flight.remove(&ticket).is_none() {
            debug!(run_id = %self.id, ticket, "Ignoring completion for unknown ticket");
            return false;
        }

        self.progress.loading_actions -= 1;
        self.progress.record(report, now);
        // a failed job indexed nothing, so nothing it reported is followed up
        if !report.outcome.is_failure() && !report.follow_ups.is_empty() {
            self.progress.total_actions += report.follow_ups.len() as u64;
            self.pending.extend(report.follow_ups.iter().cloned());
            if self.state == RunState::Draining {
                self.state = RunState::Running;
            }
        }

        self.settle();
        true
    }

    /// Stop the run. In-flight results arriving later are discarded.
    pub fn abandon(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        info!(
            run_id = %self.id,
            completed = self.progress.completed_actions,
            total = self.progress.total_actions,
            "Batch run abandoned"
        );
        self.state = RunState::Abandoned;
    }

    pub fn snapshot(&self, now: Instant) -> ProgressSnapshot {
        ProgressSnapshot::capture(
            self.id.to_string(),
            self.state,
            &self.progress,
            self.pending.len(),
            now,
        )
    }

    pub fn report(&self, now: Instant) -> BatchReport {
        BatchReport::from_progress(
            self.id.to_string(),
            self.state,
            &self.progress,
            now.saturating_duration_since(self.started_at),
        )
    }

    fn track(&mut self, job: BatchJob) -> Dispatch {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight.insert(ticket, job.clone());
        self.progress.loading_actions += 1;
        Dispatch { ticket, job }
    }

    fn settle(&mut self) {
        if self.state == RunState::Running && self.pending.is_empty() {
            self.state = RunState::Draining;
        }
        if self.state == RunState::Draining
            && self.progress.loading_actions == 0
            && self.handed_out.is_empty()
        {
            self.state = RunState::Done;
            info!(
                run_id = %self.id,
                completed = self.progress.completed_actions,
                failed = self.progress.failed_actions,
                partial = self.progress.partial_actions,
                "Batch run finished"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobOutcome;

    fn jobs(ids: std::ops::RangeInclusive<u64>) -> Vec<BatchJob> {
        ids.map(|id| BatchJob::new(id, 1, "entry")).collect()
    }

    #[test]
    fn test_dispatch_respects_cap() {
        let now = Instant::now();
        let mut run = BatchRun::new(jobs(1..=5), 3, now);
        run.start(now);

        let first = run.dispatch_ready();
        assert_eq!(first.len(), 3);
        assert_eq!(run.progress().loading_actions, 3);
        assert!(run.next_dispatch().is_none());

        let report = JobReport::new(first[0].job.clone(), JobOutcome::Success);
        assert!(run.complete(first[0].ticket, &report, now));
        assert_eq!(run.dispatch_ready().len(), 1);
    }

    #[test]
    fn test_cap_never_exceeds_the_constant() {
        let now = Instant::now();
        let mut run = BatchRun::new(jobs(1..=8), 8, now);
        run.start(now);

        assert_eq!(run.dispatch_ready().len(), MAX_CONCURRENT_JOBS);
        assert_eq!(run.progress().loading_actions, MAX_CONCURRENT_JOBS);
    }

    #[test]
    fn test_state_machine() {
        let now = Instant::now();
        let mut run = BatchRun::new(jobs(1..=1), 3, now);
        assert_eq!(run.state(), RunState::Idle);
        run.start(now);
        assert_eq!(run.state(), RunState::Running);

        let dispatch = run.next_dispatch().unwrap();
        assert_eq!(run.state(), RunState::Draining);

        let report = JobReport::new(dispatch.job.clone(), JobOutcome::Success)
            .with_follow_ups(jobs(2..=3));
        run.complete(dispatch.ticket, &report, now);
        assert_eq!(run.state(), RunState::Running);
        assert_eq!(run.progress().total_actions, 3);

        for dispatch in run.dispatch_ready() {
            let report = JobReport::new(dispatch.job.clone(), JobOutcome::Success);
            run.complete(dispatch.ticket, &report, now);
        }
        assert!(run.is_done());
        assert_eq!(run.progress().completed_actions, 3);
    }

    #[test]
    fn test_failure_follow_ups_are_dropped() {
        let now = Instant::now();
        let mut run = BatchRun::new(jobs(1..=1), 3, now);
        run.start(now);

        let dispatch = run.next_dispatch().unwrap();
        let report = JobReport::new(dispatch.job.clone(), JobOutcome::failure("engine down"))
            .with_follow_ups(jobs(2..=3));
        assert!(run.complete(dispatch.ticket, &report, now));

        assert!(run.is_done());
        assert_eq!(run.progress().total_actions, 1);
        assert_eq!(run.progress().failed_actions, 1);
        assert!(run.next_dispatch().is_none());
    }

    #[test]
    fn test_empty_run_is_done() {
        let now = Instant::now();
        let mut run = BatchRun::new(Vec::new(), 3, now);
        run.start(now);
        assert!(run.is_done());
        assert_eq!(run.snapshot(now).percent, 100.0);
    }

    #[test]
    fn test_late_and_duplicate_completions_are_ignored() {
        let now = Instant::now();
        let mut run = BatchRun::new(jobs(1..=2), 3, now);
        run.start(now);
        let dispatches = run.dispatch_ready();

        let report = JobReport::new(dispatches[0].job.clone(), JobOutcome::Success);
        assert!(run.complete(dispatches[0].ticket, &report, now));
        assert!(!run.complete(dispatches[0].ticket, &report, now));

        run.abandon();
        let report = JobReport::new(dispatches[1].job.clone(), JobOutcome::Success);
        assert!(!run.complete(dispatches[1].ticket, &report, now));
        assert_eq!(run.progress().completed_actions, 1);
        assert_eq!(run.state(), RunState::Abandoned);
    }

    #[test]
    fn test_hand_out_and_claim() {
        let now = Instant::now();
        let mut run = BatchRun::new(jobs(1..=5), 3, now);
        run.start(now);

        let batches = run.hand_out(2);
        assert_eq!(batches.len(), 3);
        assert_eq!(run.state(), RunState::Draining);
        assert!(run.claim(&BatchJob::new(99, 1, "entry")).is_none());

        for job in batches.into_iter().flatten() {
            let dispatch = run.claim(&job).unwrap();
            let report = JobReport::new(job, JobOutcome::Success);
            run.complete(dispatch.ticket, &report, now);
        }
        assert!(run.is_done());
        assert_eq!(run.progress().completed_actions, 5);
    }
}
