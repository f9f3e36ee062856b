//! Chained construction of `FilterCriteria`.

use std::collections::BTreeSet;

use tracing::{debug, instrument, warn};

use search_sync_shared::{BatchJob, ItemStatus};

use super::criteria::{FilterCriteria, PriceRange, VariantFilter};
use super::entry_type::EntryTypeRef;
use super::frontend::{FilterSettings, FrontendFetchPolicy};
use crate::hooks::{BuildQueryEvent, HookRegistry};
use crate::source::{ContentSource, QueryResolutionError};

/// Accumulates filter criteria through chained calls.
///
/// Builder methods never fail: bad input is normalized or dropped. Only
/// resolution against a `ContentSource` can fail.
///
/// # Example
///
/// ```ignore
/// let jobs = QueryFilterBuilder::new(settings)
///     .with_statuses(["live", "pending"])
///     .excluding(["internal"])
///     .entry_types(["blog:article", "news"])
///     .resolve(source.as_ref())
///     .await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryFilterBuilder {
    settings: FilterSettings,
    statuses: BTreeSet<ItemStatus>,
    excluded_type_handles: BTreeSet<String>,
    entry_types: Vec<EntryTypeRef>,
    type_names: BTreeSet<String>,
    site_id: Option<u64>,
    variants: VariantFilter,
    frontend_fetch_requested: bool,
    include_elements_without_urls: bool,
}

impl QueryFilterBuilder {
    pub fn new(settings: FilterSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Status filter from a single, possibly comma-separated, value.
    pub fn with_status(self, value: &str) -> Self {
        self.with_statuses(value.split(','))
    }

    /// Status filter from a list. Values are case-folded; anything outside
    /// the status vocabulary is dropped.
    pub fn with_statuses<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for value in values {
            let value = value.as_ref();
            match ItemStatus::parse(value) {
                Some(status) => {
                    self.statuses.insert(status);
                }
                None => debug!(status = %value, "Dropping unknown status"),
            }
        }
        self
    }

    /// Exclude items whose type/grouping handle is in `handles`.
    pub fn excluding<I, S>(mut self, handles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded_type_handles.extend(
            handles
                .into_iter()
                .map(|h| h.as_ref().trim().to_string())
                .filter(|h| !h.is_empty()),
        );
        self
    }

    /// Restrict entries to types given as `handle` or `section:handle`.
    ///
    /// Only the handle is applied; the section is recorded but not yet used
    /// for filtering, which is logged once per qualified value.
    pub fn entry_types<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for value in values {
            let Some(entry_type) = EntryTypeRef::parse(value.as_ref()) else {
                continue;
            };
            if entry_type.is_qualified() {
                warn!(
                    entry_type = %entry_type,
                    handle = %entry_type.handle,
                    "Section qualifier is not applied; filtering on the handle only"
                );
            }
            if !self.entry_types.contains(&entry_type) {
                self.entry_types.push(entry_type);
            }
        }
        self
    }

    /// Restrict to content kinds (entry, asset, category, product, ...).
    pub fn types<I, S>(mut self, type_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.type_names.extend(
            type_names
                .into_iter()
                .map(|t| t.as_ref().trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty()),
        );
        self
    }

    pub fn site(mut self, site_id: u64) -> Self {
        self.site_id = Some(site_id);
        self
    }

    /// Price bounds. Reversed bounds are swapped; NaN bounds are ignored.
    pub fn price_range(mut self, min: f64, max: Option<f64>) -> Self {
        if min.is_nan() || max.is_some_and(f64::is_nan) {
            warn!(min, ?max, "Ignoring price range with NaN bound");
            return self;
        }

        let use_promotional = self
            .variants
            .price_range
            .as_ref()
            .is_some_and(|r| r.use_promotional);
        let (min, max) = match max {
            Some(max) if max < min => (max, Some(min)),
            other => (min, other),
        };

        self.variants.price_range = Some(PriceRange {
            min,
            max,
            use_promotional,
        });
        self
    }

    /// Evaluate the price range against promotional prices where set.
    pub fn promotional_price(mut self, enabled: bool) -> Self {
        if let Some(range) = self.variants.price_range.as_mut() {
            range.use_promotional = enabled;
        }
        self
    }

    pub fn on_sale(mut self) -> Self {
        self.variants.on_sale = true;
        self
    }

    pub fn has_stock(mut self) -> Self {
        self.variants.has_stock = true;
        self
    }

    pub fn shippable(mut self) -> Self {
        self.variants.shippable = true;
        self
    }

    pub fn sku_like(mut self, pattern: &str) -> Self {
        let pattern = pattern.trim();
        self.variants.sku_like = (!pattern.is_empty()).then(|| pattern.to_string());
        self
    }

    /// Opt this query in to (or out of) frontend fetching.
    pub fn frontend_fetch(mut self, enabled: bool) -> Self {
        self.frontend_fetch_requested = enabled;
        self
    }

    pub fn include_elements_without_urls(mut self, include: bool) -> Self {
        self.include_elements_without_urls = include;
        self
    }

    /// True only when the global switch is on and this query opted in.
    pub fn is_frontend_fetch_enabled(&self) -> bool {
        self.frontend_fetch_policy().is_enabled()
    }

    /// True iff any of `types` is on the configured exclusion list.
    pub fn should_exclude_from_frontend_fetch<'a, I>(&self, types: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.frontend_fetch_policy().excludes(types)
    }

    pub fn frontend_fetch_policy(&self) -> FrontendFetchPolicy {
        FrontendFetchPolicy::resolve(&self.settings, self.frontend_fetch_requested)
    }

    /// Let registered build-query hooks refine this builder.
    pub fn apply_hooks(self, hooks: &HookRegistry<BuildQueryEvent>) -> Self {
        if hooks.is_empty() {
            return self;
        }
        let mut event = BuildQueryEvent { builder: self };
        hooks.fire(&mut event);
        event.builder
    }

    pub fn build(&self) -> FilterCriteria {
        FilterCriteria {
            statuses: self.statuses.clone(),
            excluded_type_handles: self.excluded_type_handles.clone(),
            entry_types: self.entry_types.clone(),
            type_names: self.type_names.clone(),
            site_id: self.site_id,
            variants: self.variants.clone(),
            frontend_fetch_enabled: self.is_frontend_fetch_enabled(),
            include_elements_without_urls: self.include_elements_without_urls,
        }
    }

    /// Number of matching items, without enumerating them.
    pub async fn count(&self, source: &dyn ContentSource) -> Result<u64, QueryResolutionError> {
        source.count(&self.build()).await
    }

    /// Enumerate matching items as indexing jobs.
    #[instrument(skip(self, source))]
    pub async fn resolve(
        &self,
        source: &dyn ContentSource,
    ) -> Result<Vec<BatchJob>, QueryResolutionError> {
        let jobs = source.find_jobs(&self.build()).await?;
        debug!(job_count = jobs.len(), "Resolved filter");
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statuses_are_normalized() {
        let criteria = QueryFilterBuilder::default()
            .with_statuses(["LIVE", "bogus"])
            .build();
        assert_eq!(
            criteria.statuses().iter().copied().collect::<Vec<_>>(),
            vec![ItemStatus::Live]
        );
    }

    #[test]
    fn test_single_status_string() {
        let criteria = QueryFilterBuilder::default()
            .with_status("live, Pending,nope")
            .build();
        assert_eq!(criteria.statuses().len(), 2);
        assert!(criteria.statuses().contains(&ItemStatus::Pending));
    }

    #[test]
    fn test_only_unknown_statuses_means_no_status_filter() {
        let criteria = QueryFilterBuilder::default()
            .with_statuses(["archived"])
            .build();
        assert!(criteria.statuses().is_empty());
        assert!(criteria.predicates().iter().all(|p| p.name() != "status"));
    }

    #[test]
    fn test_entry_types_keep_section() {
        let criteria = QueryFilterBuilder::default()
            .entry_types(["news", "blog:article", "news", ""])
            .build();
        assert_eq!(criteria.entry_types().len(), 2);
        assert_eq!(criteria.entry_types()[1].section.as_deref(), Some("blog"));
    }

    #[test]
    fn test_price_range_normalization() {
        let criteria = QueryFilterBuilder::default()
            .price_range(50.0, Some(10.0))
            .promotional_price(true)
            .build();
        let range = criteria.variants().price_range.clone().unwrap();
        assert_eq!(range.min, 10.0);
        assert_eq!(range.max, Some(50.0));
        assert!(range.use_promotional);

        let ignored = QueryFilterBuilder::default().price_range(f64::NAN, None).build();
        assert!(ignored.variants().price_range.is_none());
    }

    #[test]
    fn test_frontend_fetch_two_level_gate() {
        let global_off = QueryFilterBuilder::new(FilterSettings::default()).frontend_fetch(true);
        assert!(!global_off.is_frontend_fetch_enabled());

        let settings = FilterSettings::default().with_frontend_fetch(true);
        let not_opted_in = QueryFilterBuilder::new(settings.clone());
        assert!(!not_opted_in.is_frontend_fetch_enabled());

        let opted_in = QueryFilterBuilder::new(settings).frontend_fetch(true);
        assert!(opted_in.is_frontend_fetch_enabled());
        assert!(opted_in.build().frontend_fetch_enabled());
    }

    #[test]
    fn test_should_exclude_from_frontend_fetch() {
        let settings = FilterSettings::default().with_excluded_types(["asset"]);
        let builder = QueryFilterBuilder::new(settings);
        assert!(builder.should_exclude_from_frontend_fetch(["asset", "entry"]));
        assert!(!builder.should_exclude_from_frontend_fetch(["entry"]));
    }
}
