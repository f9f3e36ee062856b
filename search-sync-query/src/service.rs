//! Search execution behind the rate limiter and extension hooks.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument};

use search_sync_repository::{IndexNameError, IndexNameValidator, SearchError, SearchIndexClient};
use search_sync_shared::{SearchQuery, SearchResponse};

use crate::filter::QueryFilterBuilder;
use crate::hooks::{AfterSearchEvent, BeforeSearchEvent, SearchHooks};
use crate::rate_limit::{RateLimitExceeded, RateLimitStatus, TokenBucketRateLimiter, TrackingMethod};

/// Identity key used when the request carries nothing to track by.
const ANONYMOUS_IDENTITY: &str = "anonymous";

/// Errors returned to search callers.
#[derive(Error, Debug)]
pub enum SearchServiceError {
    #[error(transparent)]
    RateLimited(#[from] RateLimitExceeded),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Validation(#[from] IndexNameError),
}

/// Everything known about who is calling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestIdentity {
    pub ip: Option<String>,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
}

impl RequestIdentity {
    pub fn from_ip(ip: impl Into<String>) -> Self {
        Self {
            ip: Some(ip.into()),
            ..Self::default()
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// The rate-limit key for `method`, falling back to the IP when the
    /// preferred identifier is missing.
    pub fn key_for(&self, method: TrackingMethod) -> String {
        let (prefix, preferred) = match method {
            TrackingMethod::Ip => ("ip", self.ip.as_deref()),
            TrackingMethod::Session => ("session", self.session_id.as_deref()),
            TrackingMethod::User => ("user", self.user_id.as_deref()),
        };

        match (preferred, self.ip.as_deref()) {
            (Some(id), _) => format!("{prefix}:{id}"),
            (None, Some(ip)) => format!("ip:{ip}"),
            (None, None) => ANONYMOUS_IDENTITY.to_string(),
        }
    }
}

/// Rate-limited search with extension hooks.
pub struct SearchService {
    client: Arc<dyn SearchIndexClient>,
    limiter: Arc<TokenBucketRateLimiter>,
    hooks: SearchHooks,
}

impl SearchService {
    pub fn new(client: Arc<dyn SearchIndexClient>, limiter: Arc<TokenBucketRateLimiter>) -> Self {
        Self::with_hooks(client, limiter, SearchHooks::default())
    }

    pub fn with_hooks(
        client: Arc<dyn SearchIndexClient>,
        limiter: Arc<TokenBucketRateLimiter>,
        hooks: SearchHooks,
    ) -> Self {
        Self {
            client,
            limiter,
            hooks,
        }
    }

    pub fn hooks_mut(&mut self) -> &mut SearchHooks {
        &mut self.hooks
    }

    /// Run build-query hooks over a filter builder.
    pub fn prepare_filter(&self, builder: QueryFilterBuilder) -> QueryFilterBuilder {
        builder.apply_hooks(&self.hooks.build_query)
    }

    /// Execute `query` on behalf of `identity`.
    ///
    /// The rate limit is charged before anything else, so rejected index
    /// names and hook-answered searches still cost a token.
    #[instrument(skip(self, identity, query), fields(query = %query.query))]
    pub async fn search(
        &self,
        identity: &RequestIdentity,
        query: SearchQuery,
    ) -> Result<SearchResponse, SearchServiceError> {
        let key = identity.key_for(self.limiter.config().tracking_method);
        self.limiter.consume(&key, 1)?;

        if let Some(index_key) = &query.index_key {
            IndexNameValidator::ensure_valid(index_key)?;
        }

        let mut before = BeforeSearchEvent {
            query,
            identity: key,
            skip_default: false,
            response: None,
        };
        self.hooks.before_search.fire(&mut before);

        let response = if before.skip_default {
            debug!("Search answered by hook");
            before.response.take().unwrap_or_else(SearchResponse::empty)
        } else {
            self.client.search(&before.query).await?
        };

        let mut after = AfterSearchEvent {
            query: before.query,
            response,
        };
        self.hooks.after_search.fire(&mut after);

        Ok(after.response)
    }

    /// Rate-limit status for `identity`, as exposed to clients.
    pub fn rate_limit_status(&self, identity: &RequestIdentity) -> RateLimitStatus {
        let key = identity.key_for(self.limiter.config().tracking_method);
        self.limiter.status(&key)
    }
}

impl std::fmt::Debug for SearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchService")
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::RateLimitConfig;
    use async_trait::async_trait;
    use search_sync_shared::{IndexDocument, IndexStats, SearchHit};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock search client for testing
    struct MockSearchClient {
        search_count: AtomicUsize,
    }

    impl MockSearchClient {
        fn new() -> Self {
            Self {
                search_count: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SearchIndexClient for MockSearchClient {
        async fn index(&self, _document: &IndexDocument) -> Result<(), SearchError> {
            Ok(())
        }

        async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
            self.search_count.fetch_add(1, Ordering::SeqCst);
            Ok(SearchResponse {
                hits: vec![SearchHit {
                    object_id: "entry_1_1".to_string(),
                    item_id: 1,
                    site_id: 1,
                    type_name: "entry".to_string(),
                    title: query.query.clone(),
                    url: None,
                    score: 1.0,
                }],
                total: 1,
                took_ms: 3,
            })
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

    fn service(capacity: u32) -> (SearchService, Arc<MockSearchClient>) {
        let client = Arc::new(MockSearchClient::new());
        let limiter = Arc::new(TokenBucketRateLimiter::new(RateLimitConfig {
            capacity,
            burst_size: 0,
            refill_rate_per_second: 0.001,
            ..RateLimitConfig::default()
        }));
        (SearchService::new(client.clone(), limiter), client)
    }

    #[test]
    fn test_identity_key_falls_back_to_ip() {
        let identity = RequestIdentity::from_ip("10.0.0.1").with_user("42");
        assert_eq!(identity.key_for(TrackingMethod::User), "user:42");
        assert_eq!(identity.key_for(TrackingMethod::Session), "ip:10.0.0.1");
        assert_eq!(RequestIdentity::default().key_for(TrackingMethod::Ip), "anonymous");
    }

    #[tokio::test]
    async fn test_search_is_rate_limited() {
        let (service, client) = service(2);
        let identity = RequestIdentity::from_ip("10.0.0.1");

        assert!(service.search(&identity, SearchQuery::new("a")).await.is_ok());
        assert!(service.search(&identity, SearchQuery::new("b")).await.is_ok());
        let err = service
            .search(&identity, SearchQuery::new("c"))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchServiceError::RateLimited(_)));
        assert_eq!(client.search_count.load(Ordering::SeqCst), 2);

        let status = service.rate_limit_status(&identity);
        assert_eq!(status.remaining, 0);
        assert_eq!(status.limit, 2);
    }

    #[tokio::test]
    async fn test_invalid_index_key_is_rejected() {
        let (service, client) = service(10);
        let err = service
            .search(
                &RequestIdentity::from_ip("10.0.0.1"),
                SearchQuery::new("a").in_index("Bad Index"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SearchServiceError::Validation(_)));
        assert_eq!(client.search_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_before_hook_can_skip_engine() {
        let (mut service, client) = service(10);
        service
            .hooks_mut()
            .before_search
            .register("cache", |e| e.respond_with(SearchResponse::empty()));
        service
            .hooks_mut()
            .after_search
            .register("count", |e| e.response.total += 100);

        let response = service
            .search(&RequestIdentity::from_ip("10.0.0.1"), SearchQuery::new("a"))
            .await
            .unwrap();
        assert_eq!(response.total, 100);
        assert_eq!(client.search_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_before_hook_can_rewrite_query() {
        let (mut service, _client) = service(10);
        service
            .hooks_mut()
            .before_search
            .register("lowercase", |e| e.query.query = e.query.query.to_lowercase());

        let response = service
            .search(&RequestIdentity::from_ip("10.0.0.1"), SearchQuery::new("BOOTS"))
            .await
            .unwrap();
        assert_eq!(response.hits[0].title, "boots");
    }
}
