//! # Search Sync Pipeline
//!
//! This crate turns content records into indexed search documents and drives
//! reindexing runs over many of them.
//!
//! ## Architecture
//!
//! 1. **Factory**: validates raw content and builds `IndexableItem`s
//! 2. **Job**: indexes one item, degrading to a partial document when
//!    enrichment fails
//! 3. **Run**: the per-run state machine holding `BatchProgress`
//! 4. **Orchestrator**: dispatches jobs under a concurrency cap and publishes
//!    progress
//! 5. **Endpoint**: drives a run from a remote caller, one request at a time

pub mod endpoint;
pub mod enrichment;
pub mod errors;
pub mod factory;
pub mod item;
pub mod job;
pub mod orchestrator;
pub mod params;
pub mod progress;
pub mod registry;
pub mod report;
pub mod run;
pub mod speed;

pub use endpoint::{BatchEndpoint, ItemResult, ProgressRequest, ProgressResponse};
pub use enrichment::{ContentEnricher, EnrichmentConfig, HttpContentFetcher};
pub use errors::{EnrichmentError, InvalidItemDataError, PipelineError};
pub use factory::{BatchCreation, IndexableItemFactory, SkippedEntry};
pub use item::IndexableItem;
pub use job::{IndexJob, IndexJobContext, IndexJobRunner, JobOutcome, JobReport, JobRunner};
pub use orchestrator::{AbandonHandle, OrchestratorConfig, ReindexOrchestrator, MAX_CONCURRENT_JOBS};
pub use params::ReindexParams;
pub use progress::{BatchProgress, ProgressSnapshot};
pub use registry::{HostModules, TypeDefinition, TypeRegistry};
pub use report::BatchReport;
pub use run::{BatchRun, Dispatch, RunState};
pub use speed::{format_eta, SpeedEstimator};
