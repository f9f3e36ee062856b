//! Aggregate progress of one batch run.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use search_sync_shared::{FailureRecord, PartialRecord};

use crate::job::{JobOutcome, JobReport};
use crate::run::RunState;
use crate::speed::{format_eta, SpeedEstimator};

/// Counters and outcome records of a run.
///
/// Every completed job increments `completed_actions` once and lands in
/// exactly one of success, partial or failure.
#[derive(Debug, Clone)]
pub struct BatchProgress {
    pub total_actions: u64,
    pub completed_actions: u64,
    pub failed_actions: u64,
    pub partial_actions: u64,
    pub loading_actions: usize,
    pub failed_entries: Vec<FailureRecord>,
    pub partial_entries: Vec<PartialRecord>,
    speed: SpeedEstimator,
}

impl BatchProgress {
    pub fn new(total_actions: u64, now: Instant) -> Self {
        Self {
            total_actions,
            completed_actions: 0,
            failed_actions: 0,
            partial_actions: 0,
            loading_actions: 0,
            failed_entries: Vec::new(),
            partial_entries: Vec::new(),
            speed: SpeedEstimator::new(now),
        }
    }

    pub fn success_actions(&self) -> u64 {
        self.completed_actions - self.failed_actions - self.partial_actions
    }

    /// `completed / total` as a percentage; 100 for an empty run.
    pub fn percent(&self) -> f64 {
        if self.total_actions == 0 {
            return 100.0;
        }
        (self.completed_actions as f64 / self.total_actions as f64 * 100.0).min(100.0)
    }

    pub fn speed(&self) -> &SpeedEstimator {
        &self.speed
    }

    pub(crate) fn record(&mut self, report: &JobReport, now: Instant) {
        self.completed_actions += 1;
        match &report.outcome {
            JobOutcome::Success => {}
            JobOutcome::Partial { reason } => {
                self.partial_actions += 1;
                self.partial_entries.push(PartialRecord {
                    item_id: report.job.item_id,
                    site_id: report.job.site_id,
                    type_name: report.job.type_name.clone(),
                    reason: reason.clone(),
                });
            }
            JobOutcome::Failure { error } => {
                self.failed_actions += 1;
                self.failed_entries.push(FailureRecord {
                    item_id: report.job.item_id,
                    site_id: report.job.site_id,
                    type_name: report.job.type_name.clone(),
                    error: error.clone(),
                });
            }
        }
        self.speed.record_at(self.completed_actions, now);
    }

    pub fn eta_seconds_at(&self, now: Instant) -> Option<u64> {
        self.speed
            .eta_seconds_at(self.completed_actions, self.total_actions, now)
    }
}

/// Point-in-time view of a run, as rendered by a UI or CLI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub run_id: String,
    pub state: RunState,
    pub total_actions: u64,
    pub completed_actions: u64,
    pub failed_actions: u64,
    pub partial_actions: u64,
    pub loading_actions: usize,
    pub pending_actions: usize,
    pub percent: f64,
    /// Items per second.
    pub speed: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
}

impl ProgressSnapshot {
    pub(crate) fn capture(
        run_id: String,
        state: RunState,
        progress: &BatchProgress,
        pending_actions: usize,
        now: Instant,
    ) -> Self {
        let eta_seconds = progress.eta_seconds_at(now);
        Self {
            run_id,
            state,
            total_actions: progress.total_actions,
            completed_actions: progress.completed_actions,
            failed_actions: progress.failed_actions,
            partial_actions: progress.partial_actions,
            loading_actions: progress.loading_actions,
            pending_actions,
            percent: progress.percent(),
            speed: progress
                .speed
                .average_speed_at(progress.completed_actions, now),
            eta_seconds,
            eta: eta_seconds.map(format_eta),
        }
    }
}
