//! Composable item predicates.
//!
//! Item-level predicates look at a whole `ContentRecord`. Variant-level
//! conditions look at a single `Variant`; `HasVariantPredicate` requires one
//! variant to satisfy all of them.

use std::collections::BTreeSet;
use std::fmt;

use regex::Regex;

use search_sync_shared::{ContentRecord, ItemStatus, Variant};

use super::criteria::PriceRange;
use super::entry_type::EntryTypeRef;

/// Content type whose records carry entry type handles.
const ENTRY_TYPE_NAME: &str = "entry";

/// A condition on a content record.
pub trait ItemPredicate: fmt::Debug + Send + Sync {
    /// Short name, used in logs.
    fn name(&self) -> &'static str;

    fn matches(&self, record: &ContentRecord) -> bool;
}

/// A condition on one variant of a record.
pub trait VariantCondition: fmt::Debug + Send + Sync {
    fn matches_variant(&self, variant: &Variant) -> bool;
}

#[derive(Debug, Clone)]
pub struct StatusPredicate {
    statuses: BTreeSet<ItemStatus>,
}

impl StatusPredicate {
    pub fn new(statuses: BTreeSet<ItemStatus>) -> Self {
        Self { statuses }
    }
}

impl ItemPredicate for StatusPredicate {
    fn name(&self) -> &'static str {
        "status"
    }

    fn matches(&self, record: &ContentRecord) -> bool {
        self.statuses.contains(&record.status)
    }
}

#[derive(Debug, Clone)]
pub struct SitePredicate {
    site_id: u64,
}

impl SitePredicate {
    pub fn new(site_id: u64) -> Self {
        Self { site_id }
    }
}

impl ItemPredicate for SitePredicate {
    fn name(&self) -> &'static str {
        "site"
    }

    fn matches(&self, record: &ContentRecord) -> bool {
        record.site_id == self.site_id
    }
}

/// Restricts to content kinds (entry, asset, product, ...).
#[derive(Debug, Clone)]
pub struct TypeNamePredicate {
    type_names: BTreeSet<String>,
}

impl TypeNamePredicate {
    pub fn new(type_names: BTreeSet<String>) -> Self {
        Self { type_names }
    }
}

impl ItemPredicate for TypeNamePredicate {
    fn name(&self) -> &'static str {
        "type_name"
    }

    fn matches(&self, record: &ContentRecord) -> bool {
        self.type_names.contains(&record.type_name)
    }
}

/// Negative filter on the record's type/grouping handle.
#[derive(Debug, Clone)]
pub struct ExcludedTypesPredicate {
    handles: BTreeSet<String>,
}

impl ExcludedTypesPredicate {
    pub fn new(handles: BTreeSet<String>) -> Self {
        Self { handles }
    }
}

impl ItemPredicate for ExcludedTypesPredicate {
    fn name(&self) -> &'static str {
        "excluded_types"
    }

    fn matches(&self, record: &ContentRecord) -> bool {
        record
            .type_handle
            .as_ref()
            .map_or(true, |handle| !self.handles.contains(handle))
    }
}

/// Restricts entries to the given entry type handles.
///
/// Section qualifiers are not applied: `blog:article` matches an `article`
/// entry in any section. Records of other kinds pass untouched.
#[derive(Debug, Clone)]
pub struct EntryTypePredicate {
    handles: BTreeSet<String>,
}

impl EntryTypePredicate {
    pub fn new(entry_types: &[EntryTypeRef]) -> Self {
        Self {
            handles: entry_types.iter().map(|t| t.handle.clone()).collect(),
        }
    }
}

impl ItemPredicate for EntryTypePredicate {
    fn name(&self) -> &'static str {
        "entry_type"
    }

    fn matches(&self, record: &ContentRecord) -> bool {
        if record.type_name != ENTRY_TYPE_NAME {
            return true;
        }
        record
            .type_handle
            .as_ref()
            .is_some_and(|handle| self.handles.contains(handle))
    }
}

/// Drops records that have no frontend URL.
#[derive(Debug, Clone, Copy)]
pub struct HasUrlPredicate;

impl ItemPredicate for HasUrlPredicate {
    fn name(&self) -> &'static str {
        "has_url"
    }

    fn matches(&self, record: &ContentRecord) -> bool {
        record.has_url()
    }
}

/// At least one variant satisfies every condition.
#[derive(Debug)]
pub struct HasVariantPredicate {
    conditions: Vec<Box<dyn VariantCondition>>,
}

impl HasVariantPredicate {
    pub fn new(conditions: Vec<Box<dyn VariantCondition>>) -> Self {
        Self { conditions }
    }
}

impl ItemPredicate for HasVariantPredicate {
    fn name(&self) -> &'static str {
        "has_variant"
    }

    fn matches(&self, record: &ContentRecord) -> bool {
        record
            .variants
            .iter()
            .any(|variant| self.conditions.iter().all(|c| c.matches_variant(variant)))
    }
}

#[derive(Debug, Clone)]
pub struct PriceRangePredicate {
    range: PriceRange,
}

impl PriceRangePredicate {
    pub fn new(range: PriceRange) -> Self {
        Self { range }
    }
}

impl VariantCondition for PriceRangePredicate {
    fn matches_variant(&self, variant: &Variant) -> bool {
        self.range
            .contains(variant.effective_price(self.range.use_promotional))
    }
}

/// Promotional price set and above zero.
#[derive(Debug, Clone, Copy)]
pub struct OnSalePredicate;

impl VariantCondition for OnSalePredicate {
    fn matches_variant(&self, variant: &Variant) -> bool {
        variant.promotional_price.is_some_and(|price| price > 0.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HasStockPredicate;

impl VariantCondition for HasStockPredicate {
    fn matches_variant(&self, variant: &Variant) -> bool {
        variant.in_stock()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ShippablePredicate;

impl VariantCondition for ShippablePredicate {
    fn matches_variant(&self, variant: &Variant) -> bool {
        variant.shippable
    }
}

/// Case-insensitive SKU match. `*` and `%` are wildcards; a pattern without
/// wildcards matches anywhere in the SKU.
#[derive(Debug, Clone)]
pub struct SkuLikePredicate {
    pattern: Regex,
}

impl SkuLikePredicate {
    pub fn new(pattern: &str) -> Option<Self> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return None;
        }

        let is_wildcard = |c: char| c == '*' || c == '%';
        let expression = if pattern.contains(is_wildcard) {
            let parts: Vec<String> = pattern.split(is_wildcard).map(regex::escape).collect();
            format!("(?i)^{}$", parts.join(".*"))
        } else {
            format!("(?i){}", regex::escape(pattern))
        };

        Regex::new(&expression).ok().map(|pattern| Self { pattern })
    }
}

impl VariantCondition for SkuLikePredicate {
    fn matches_variant(&self, variant: &Variant) -> bool {
        self.pattern.is_match(&variant.sku)
    }
}
