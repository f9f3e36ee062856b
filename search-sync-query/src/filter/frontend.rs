//! Frontend fetch gating.
//!
//! Fetching rendered pages to enrich documents costs one HTTP request per
//! item, so it needs both the global switch and an explicit per-query opt-in.

use std::collections::BTreeSet;

/// Global filter settings, injected into every builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSettings {
    /// Global frontend-fetch switch.
    pub frontend_fetch_enabled: bool,
    /// Type handles never fetched from the frontend.
    pub frontend_fetch_excluded_types: BTreeSet<String>,
}

impl FilterSettings {
    pub fn with_frontend_fetch(mut self, enabled: bool) -> Self {
        self.frontend_fetch_enabled = enabled;
        self
    }

    pub fn with_excluded_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.frontend_fetch_excluded_types = types.into_iter().map(Into::into).collect();
        self
    }
}

/// Resolved frontend-fetch decision for one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontendFetchPolicy {
    enabled: bool,
    excluded_types: BTreeSet<String>,
}

impl FrontendFetchPolicy {
    /// Combine the global switch with the query's opt-in.
    pub fn resolve(settings: &FilterSettings, requested: bool) -> Self {
        Self {
            enabled: settings.frontend_fetch_enabled && requested,
            excluded_types: settings.frontend_fetch_excluded_types.clone(),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// True iff any of `types` is on the exclusion list.
    pub fn excludes<'a, I>(&self, types: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        types
            .into_iter()
            .any(|t| self.excluded_types.contains(t))
    }

    /// Whether an item of these types should be fetched.
    pub fn applies_to<'a, I>(&self, types: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.enabled && !self.excludes(types)
    }
}
