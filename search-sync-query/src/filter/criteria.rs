//! Immutable filter criteria.

use std::collections::BTreeSet;

use tracing::warn;

use search_sync_shared::{ContentRecord, ItemStatus};

use super::entry_type::EntryTypeRef;
use super::predicates::{
    EntryTypePredicate, ExcludedTypesPredicate, HasStockPredicate, HasUrlPredicate,
    HasVariantPredicate, ItemPredicate, OnSalePredicate, PriceRangePredicate, ShippablePredicate,
    SitePredicate, SkuLikePredicate, StatusPredicate, TypeNamePredicate, VariantCondition,
};

/// Inclusive price bounds, optionally evaluated against promotional prices.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: Option<f64>,
    pub use_promotional: bool,
}

impl PriceRange {
    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && self.max.map_or(true, |max| price <= max)
    }
}

/// Conditions a single variant of the item must satisfy together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantFilter {
    pub price_range: Option<PriceRange>,
    pub on_sale: bool,
    pub has_stock: bool,
    pub shippable: bool,
    pub sku_like: Option<String>,
}

impl VariantFilter {
    pub fn is_empty(&self) -> bool {
        self.price_range.is_none()
            && !self.on_sale
            && !self.has_stock
            && !self.shippable
            && self.sku_like.is_none()
    }
}

/// Which content items are indexable.
///
/// Built by `QueryFilterBuilder`; immutable afterwards. An empty status set
/// means no status filter, not "match nothing".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub(crate) statuses: BTreeSet<ItemStatus>,
    pub(crate) excluded_type_handles: BTreeSet<String>,
    pub(crate) entry_types: Vec<EntryTypeRef>,
    pub(crate) type_names: BTreeSet<String>,
    pub(crate) site_id: Option<u64>,
    pub(crate) variants: VariantFilter,
    pub(crate) frontend_fetch_enabled: bool,
    pub(crate) include_elements_without_urls: bool,
}

impl FilterCriteria {
    pub fn statuses(&self) -> &BTreeSet<ItemStatus> {
        &self.statuses
    }

    pub fn excluded_type_handles(&self) -> &BTreeSet<String> {
        &self.excluded_type_handles
    }

    pub fn entry_types(&self) -> &[EntryTypeRef] {
        &self.entry_types
    }

    pub fn type_names(&self) -> &BTreeSet<String> {
        &self.type_names
    }

    pub fn site_id(&self) -> Option<u64> {
        self.site_id
    }

    pub fn variants(&self) -> &VariantFilter {
        &self.variants
    }

    /// Effective frontend-fetch flag: global switch AND per-query opt-in.
    pub fn frontend_fetch_enabled(&self) -> bool {
        self.frontend_fetch_enabled
    }

    pub fn include_elements_without_urls(&self) -> bool {
        self.include_elements_without_urls
    }

    /// The predicates this criteria composes, all of which must hold.
    pub fn predicates(&self) -> Vec<Box<dyn ItemPredicate>> {
        let mut predicates: Vec<Box<dyn ItemPredicate>> = Vec::new();

        if !self.statuses.is_empty() {
            predicates.push(Box::new(StatusPredicate::new(self.statuses.clone())));
        }
        if let Some(site_id) = self.site_id {
            predicates.push(Box::new(SitePredicate::new(site_id)));
        }
        if !self.type_names.is_empty() {
            predicates.push(Box::new(TypeNamePredicate::new(self.type_names.clone())));
        }
        if !self.excluded_type_handles.is_empty() {
            predicates.push(Box::new(ExcludedTypesPredicate::new(
                self.excluded_type_handles.clone(),
            )));
        }
        if !self.entry_types.is_empty() {
            predicates.push(Box::new(EntryTypePredicate::new(&self.entry_types)));
        }
        if !self.include_elements_without_urls {
            predicates.push(Box::new(HasUrlPredicate));
        }
        if !self.variants.is_empty() {
            predicates.push(Box::new(HasVariantPredicate::new(self.variant_conditions())));
        }

        predicates
    }

    fn variant_conditions(&self) -> Vec<Box<dyn VariantCondition>> {
        let mut conditions: Vec<Box<dyn VariantCondition>> = Vec::new();
        let filter = &self.variants;

        if let Some(range) = &filter.price_range {
            conditions.push(Box::new(PriceRangePredicate::new(range.clone())));
        }
        if filter.on_sale {
            conditions.push(Box::new(OnSalePredicate));
        }
        if filter.has_stock {
            conditions.push(Box::new(HasStockPredicate));
        }
        if filter.shippable {
            conditions.push(Box::new(ShippablePredicate));
        }
        if let Some(pattern) = &filter.sku_like {
            match SkuLikePredicate::new(pattern) {
                Some(predicate) => conditions.push(Box::new(predicate)),
                None => warn!(pattern = %pattern, "Ignoring unusable SKU pattern"),
            }
        }

        conditions
    }

    /// Whether a record passes every predicate.
    pub fn matches(&self, record: &ContentRecord) -> bool {
        self.predicates().iter().all(|p| p.matches(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_range_bounds() {
        let range = PriceRange {
            min: 10.0,
            max: Some(20.0),
            use_promotional: false,
        };
        assert!(range.contains(10.0));
        assert!(range.contains(20.0));
        assert!(!range.contains(20.01));

        let open = PriceRange {
            min: 5.0,
            max: None,
            use_promotional: false,
        };
        assert!(open.contains(10_000.0));
        assert!(!open.contains(4.99));
    }

    #[test]
    fn test_default_criteria_only_requires_urls() {
        let criteria = FilterCriteria::default();
        let predicates = criteria.predicates();
        assert_eq!(predicates.len(), 1);
        assert_eq!(predicates[0].name(), "has_url");
    }
}
