//! Reindex parameters as accepted from callers.

use serde::{Deserialize, Serialize};

use search_sync_query::{FilterSettings, QueryFilterBuilder};

/// Selection of items to reindex.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReindexParams {
    /// Status values; each may itself be a comma-separated list.
    pub statuses: Vec<String>,
    /// Type handles to leave out.
    pub exclude: Vec<String>,
    /// `handle` or `section:handle`.
    pub entry_types: Vec<String>,
    /// Content kinds (entry, asset, ...).
    pub types: Vec<String>,
    pub site_id: Option<u64>,
    pub frontend_fetch: bool,
    pub include_elements_without_urls: bool,
}

impl ReindexParams {
    pub fn to_builder(&self, settings: FilterSettings) -> QueryFilterBuilder {
        let mut builder = QueryFilterBuilder::new(settings)
            .with_statuses(self.statuses.iter().flat_map(|s| s.split(',')))
            .excluding(&self.exclude)
            .entry_types(&self.entry_types)
            .types(&self.types)
            .frontend_fetch(self.frontend_fetch)
            .include_elements_without_urls(self.include_elements_without_urls);

        if let Some(site_id) = self.site_id {
            builder = builder.site(site_id);
        }
        builder
    }
}
