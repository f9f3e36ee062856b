//! Filter DSL for selecting indexable content items.
//!
//! Filters are small predicate objects composed by `QueryFilterBuilder` into
//! an immutable `FilterCriteria`, which a `ContentSource` resolves.

mod builder;
mod criteria;
mod entry_type;
mod frontend;
mod predicates;

pub use builder::QueryFilterBuilder;
pub use criteria::{FilterCriteria, PriceRange, VariantFilter};
pub use entry_type::EntryTypeRef;
pub use frontend::{FilterSettings, FrontendFetchPolicy};
pub use predicates::{
    EntryTypePredicate, ExcludedTypesPredicate, HasStockPredicate, HasUrlPredicate,
    HasVariantPredicate, ItemPredicate, OnSalePredicate, PriceRangePredicate, ShippablePredicate,
    SitePredicate, SkuLikePredicate, StatusPredicate, TypeNamePredicate, VariantCondition,
};
