//! End-of-run summary.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use search_sync_shared::{FailureRecord, PartialRecord};

use crate::progress::BatchProgress;
use crate::run::RunState;

/// Terminal report of a batch run.
///
/// Partial items (warnings) are listed before failed items.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub run_id: String,
    pub state: RunState,
    pub total_actions: u64,
    pub completed_actions: u64,
    pub success_actions: u64,
    pub partial_actions: u64,
    pub failed_actions: u64,
    pub partial_entries: Vec<PartialRecord>,
    pub failed_entries: Vec<FailureRecord>,
    pub elapsed_secs: f64,
}

impl BatchReport {
    pub(crate) fn from_progress(
        run_id: String,
        state: RunState,
        progress: &BatchProgress,
        elapsed: Duration,
    ) -> Self {
        Self {
            run_id,
            state,
            total_actions: progress.total_actions,
            completed_actions: progress.completed_actions,
            success_actions: progress.success_actions(),
            partial_actions: progress.partial_actions,
            failed_actions: progress.failed_actions,
            partial_entries: progress.partial_entries.clone(),
            failed_entries: progress.failed_entries.clone(),
            elapsed_secs: elapsed.as_secs_f64(),
        }
    }

    pub fn has_problems(&self) -> bool {
        self.partial_actions > 0 || self.failed_actions > 0
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Reindex {}: {}/{} completed ({} ok, {} partial, {} failed) in {:.1}s",
            self.state,
            self.completed_actions,
            self.total_actions,
            self.success_actions,
            self.partial_actions,
            self.failed_actions,
            self.elapsed_secs
        )?;

        if !self.partial_entries.is_empty() {
            writeln!(f, "Warnings (indexed without content):")?;
            for entry in &self.partial_entries {
                writeln!(
                    f,
                    "  {} #{} (site {}): {}",
                    entry.type_name, entry.item_id, entry.site_id, entry.reason
                )?;
            }
        }

        if !self.failed_entries.is_empty() {
            writeln!(f, "Failures:")?;
            for entry in &self.failed_entries {
                writeln!(
                    f,
                    "  {} #{} (site {}): {}",
                    entry.type_name, entry.item_id, entry.site_id, entry.error
                )?;
            }
        }

        Ok(())
    }
}
