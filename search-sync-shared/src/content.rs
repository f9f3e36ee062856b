//! Content records as handed out by a content source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::status::ItemStatus;

/// A purchasable variant of a product-like content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub sku: String,
    pub price: f64,
    #[serde(default)]
    pub promotional_price: Option<f64>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub unlimited_stock: bool,
    #[serde(default)]
    pub shippable: bool,
}

impl Variant {
    /// Price used for range filtering. The promotional price only counts when
    /// asked for and when it is actually set.
    pub fn effective_price(&self, use_promotional: bool) -> f64 {
        match self.promotional_price {
            Some(promo) if use_promotional && promo > 0.0 => promo,
            _ => self.price,
        }
    }

    pub fn in_stock(&self) -> bool {
        self.unlimited_stock || self.stock.is_some_and(|stock| stock > 0)
    }
}

/// A content item as stored by the content repository.
///
/// This is the source-side shape; the pipeline turns it into an
/// `IndexableItem` before indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub item_id: u64,
    pub site_id: u64,
    /// Content kind: entry, asset, category, product, digital-product.
    pub type_name: String,
    /// Handle of the type/grouping the item belongs to (entry type, volume, group).
    #[serde(default)]
    pub type_handle: Option<String>,
    /// Handle of the section for entries.
    #[serde(default)]
    pub section_handle: Option<String>,
    #[serde(default)]
    pub parent_id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub status: ItemStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl ContentRecord {
    pub fn new(item_id: u64, site_id: u64, type_name: impl Into<String>, status: ItemStatus) -> Self {
        Self {
            item_id,
            site_id,
            type_name: type_name.into(),
            type_handle: None,
            section_handle: None,
            parent_id: None,
            title: None,
            slug: None,
            uri: None,
            url: None,
            status,
            created_at: None,
            updated_at: None,
            attributes: Map::new(),
            variants: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_type_handle(mut self, handle: impl Into<String>) -> Self {
        self.type_handle = Some(handle.into());
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section_handle = Some(section.into());
        self
    }

    pub fn with_parent(mut self, parent_id: u64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variants.push(variant);
        self
    }

    /// Whether the item resolves to a URL on the frontend.
    pub fn has_url(&self) -> bool {
        self.uri.as_deref().is_some_and(|uri| !uri.is_empty())
            || self.url.as_deref().is_some_and(|url| !url.is_empty())
    }
}
