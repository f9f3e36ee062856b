//! # Search Sync Query
//!
//! The query side of content search sync:
//!
//! 1. **Filter**: composable criteria deciding which content items are indexable
//! 2. **Source**: the content-repository seam the criteria resolve against
//! 3. **Rate limit**: token buckets protecting the search endpoint
//! 4. **Hooks / Service**: extension points around search execution

pub mod filter;
pub mod hooks;
pub mod rate_limit;
pub mod service;
pub mod source;

pub use filter::{
    EntryTypeRef, FilterCriteria, FilterSettings, FrontendFetchPolicy, ItemPredicate, PriceRange,
    QueryFilterBuilder,
};
pub use hooks::{AfterSearchEvent, BeforeSearchEvent, BuildQueryEvent, HookRegistry, SearchHooks};
pub use rate_limit::{
    RateLimitConfig, RateLimitExceeded, RateLimitStatus, TokenBucketRateLimiter, TrackingMethod,
};
pub use service::{RequestIdentity, SearchService, SearchServiceError};
pub use source::{ContentSource, MemoryContentSource, QueryResolutionError};
