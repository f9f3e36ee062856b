//! Reindex runs driven end to end by the orchestrator.

mod common;

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::{entry, Script, ScriptedRunner};
use search_sync_pipeline::{
    JobOutcome, OrchestratorConfig, PipelineError, ReindexOrchestrator, RunState,
    MAX_CONCURRENT_JOBS,
};
use search_sync_query::{FilterSettings, MemoryContentSource, QueryFilterBuilder};
use search_sync_shared::{ContentRecord, ItemStatus};

#[tokio::test(start_paused = true)]
async fn test_seed_with_discovered_follow_ups() {
    let mut scripts = HashMap::new();
    scripts.insert(1, Script::ok().follow_ups((2..=6).map(entry).collect()));
    scripts.insert(3, Script::ok().outcome(JobOutcome::failure("engine rejected document")));
    scripts.insert(4, Script::ok().outcome(JobOutcome::partial("content fetch failed")));
    let runner = Arc::new(ScriptedRunner::new(scripts));

    let mut orchestrator = ReindexOrchestrator::new(runner.clone());
    let progress = orchestrator.subscribe();
    let report = orchestrator.run(vec![entry(1)]).await.unwrap();

    assert_eq!(report.state, RunState::Done);
    assert_eq!(report.total_actions, 6);
    assert_eq!(report.completed_actions, 6);
    assert_eq!(report.failed_actions, 1);
    assert_eq!(report.partial_actions, 1);
    assert_eq!(report.success_actions, 4);
    assert_eq!(report.failed_entries[0].item_id, 3);
    assert_eq!(report.partial_entries[0].item_id, 4);
    assert_eq!(runner.runs.load(Ordering::SeqCst), 6);

    let last = progress.borrow().clone();
    assert_eq!(last.state, RunState::Done);
    assert_eq!(last.percent, 100.0);
    assert_eq!(last.loading_actions, 0);
}

#[tokio::test(start_paused = true)]
async fn test_never_more_than_three_in_flight() {
    let mut scripts = HashMap::new();
    for id in 1..=4 {
        let children = (id * 10..id * 10 + 4).map(entry).collect();
        scripts.insert(id, Script::ok().follow_ups(children).delay(Duration::from_millis(50)));
    }
    let runner = Arc::new(ScriptedRunner::new(scripts));

    let mut orchestrator = ReindexOrchestrator::new(runner.clone());
    let report = orchestrator.run((1..=4).map(entry).collect()).await.unwrap();

    assert_eq!(report.completed_actions, 20);
    assert_eq!(report.total_actions, 20);
    assert_eq!(runner.peak.load(Ordering::SeqCst), MAX_CONCURRENT_JOBS);
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_job_counts_as_failure() {
    let mut scripts = HashMap::new();
    scripts.insert(2, Script::ok().delay(Duration::from_secs(3600)));
    let runner = Arc::new(ScriptedRunner::new(scripts));

    let mut orchestrator = ReindexOrchestrator::with_config(
        runner,
        OrchestratorConfig {
            job_timeout: Duration::from_secs(30),
            ..OrchestratorConfig::default()
        },
    );
    let report = orchestrator.run((1..=3).map(entry).collect()).await.unwrap();

    assert_eq!(report.completed_actions, 3);
    assert_eq!(report.failed_actions, 1);
    assert_eq!(report.failed_entries[0].error, "Timed out after 30s");
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_run_stops() {
    let mut scripts = HashMap::new();
    for id in 1..=10 {
        scripts.insert(id, Script::ok().delay(Duration::from_secs(10)));
    }
    let runner = Arc::new(ScriptedRunner::new(scripts));

    let mut orchestrator = ReindexOrchestrator::new(runner.clone());
    let abandon = orchestrator.abandon_handle();
    let progress = orchestrator.subscribe();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(15)).await;
        abandon.abandon();
    });

    let err = orchestrator
        .run((1..=10).map(entry).collect())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Abandoned(_)));

    let last = progress.borrow().clone();
    assert_eq!(last.state, RunState::Abandoned);
    assert_eq!(last.completed_actions, 3);
    assert!(runner.runs.load(Ordering::SeqCst) < 10);
}

#[tokio::test]
async fn test_start_from_filter() {
    let source = MemoryContentSource::new(vec![
        ContentRecord::new(1, 1, "entry", ItemStatus::Live).with_url("https://example.com/1"),
        ContentRecord::new(2, 1, "entry", ItemStatus::Disabled).with_url("https://example.com/2"),
        ContentRecord::new(3, 1, "entry", ItemStatus::Live).with_url("https://example.com/3"),
    ]);
    let runner = Arc::new(ScriptedRunner::new(HashMap::new()));

    let mut orchestrator = ReindexOrchestrator::new(runner);
    let report = orchestrator
        .start_from_filter(&QueryFilterBuilder::default().with_status("live"), &source)
        .await
        .unwrap();

    assert_eq!(report.total_actions, 2);
    assert!(!report.has_problems());
}

#[tokio::test]
async fn test_start_from_filter_passes_frontend_fetch_decision() {
    let source = MemoryContentSource::new(vec![
        ContentRecord::new(1, 1, "entry", ItemStatus::Live).with_url("https://example.com/1"),
        ContentRecord::new(2, 1, "entry", ItemStatus::Live).with_url("https://example.com/2"),
    ]);
    let settings = FilterSettings::default().with_frontend_fetch(true);
    let runner = Arc::new(ScriptedRunner::new(HashMap::new()));
    let mut orchestrator = ReindexOrchestrator::new(runner.clone());

    orchestrator
        .start_from_filter(&QueryFilterBuilder::new(settings.clone()), &source)
        .await
        .unwrap();
    assert_eq!(runner.fetching.load(Ordering::SeqCst), 0);

    orchestrator
        .start_from_filter(&QueryFilterBuilder::new(settings).frontend_fetch(true), &source)
        .await
        .unwrap();
    assert_eq!(runner.runs.load(Ordering::SeqCst), 4);
    assert_eq!(runner.fetching.load(Ordering::SeqCst), 2);
}
