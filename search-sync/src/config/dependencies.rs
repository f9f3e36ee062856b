//! Dependency initialization and wiring for search sync.

use std::sync::Arc;

use tracing::info;

use search_sync_pipeline::{
    ContentEnricher, EnrichmentConfig, HttpContentFetcher, IndexJobContext, IndexJobRunner,
    IndexableItemFactory, ReindexOrchestrator, TypeRegistry,
};
use search_sync_query::{ContentSource, QueryFilterBuilder, SearchService, TokenBucketRateLimiter};
use search_sync_repository::{OpenSearchClient, SearchIndexClient};

use super::Settings;
use crate::AppError;

/// Container for all initialized dependencies.
pub struct Dependencies {
    pub settings: Settings,
    pub search_client: Arc<dyn SearchIndexClient>,
    pub factory: Arc<IndexableItemFactory>,
    pub enricher: Option<Arc<dyn ContentEnricher>>,
    pub limiter: Arc<TokenBucketRateLimiter>,
}

impl Dependencies {
    /// Connect to OpenSearch and build the shared services.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(AppError)` - If OpenSearch is unreachable or setup fails
    pub async fn new(settings: Settings) -> Result<Self, AppError> {
        info!(
            opensearch_url = %settings.opensearch_url,
            index_prefix = %settings.index_prefix,
            frontend_fetch = settings.filter.frontend_fetch_enabled,
            "Initializing dependencies"
        );

        let search_client = OpenSearchClient::new(&settings.opensearch_url, &settings.index_prefix)
            .await
            .map_err(|e| AppError::config(format!("Failed to create OpenSearch client: {}", e)))?;

        if !search_client.test_connection().await {
            return Err(AppError::config("OpenSearch is unreachable"));
        }

        info!("OpenSearch connection verified");

        Self::with_client(settings, Arc::new(search_client))
    }

    /// Build the services around an existing search client.
    pub fn with_client(
        settings: Settings,
        search_client: Arc<dyn SearchIndexClient>,
    ) -> Result<Self, AppError> {
        let registry = TypeRegistry::with_modules(settings.host_modules);
        let factory = Arc::new(IndexableItemFactory::new(Arc::new(registry)));

        // frontend fetching can never be enabled per query without the global switch
        let enricher: Option<Arc<dyn ContentEnricher>> = if settings.filter.frontend_fetch_enabled {
            Some(Arc::new(HttpContentFetcher::new(EnrichmentConfig::default())?))
        } else {
            None
        };

        let limiter = Arc::new(TokenBucketRateLimiter::new(settings.rate_limit.clone()));

        Ok(Self {
            settings,
            search_client,
            factory,
            enricher,
            limiter,
        })
    }

    /// A filter builder carrying the global filter settings.
    pub fn filter_builder(&self) -> QueryFilterBuilder {
        QueryFilterBuilder::new(self.settings.filter.clone())
    }

    pub fn search_service(&self) -> SearchService {
        SearchService::new(self.search_client.clone(), self.limiter.clone())
    }

    pub fn job_runner(&self, source: Arc<dyn ContentSource>) -> IndexJobRunner {
        IndexJobRunner::new(IndexJobContext {
            source,
            client: self.search_client.clone(),
            factory: self.factory.clone(),
            enricher: self.enricher.clone(),
            discover_children: self.settings.discover_children,
        })
    }

    /// An orchestrator whose jobs read from `source`.
    pub fn orchestrator(&self, source: Arc<dyn ContentSource>) -> ReindexOrchestrator {
        let runner = self.job_runner(source);
        ReindexOrchestrator::with_config(Arc::new(runner), self.settings.orchestrator.clone())
    }
}
