//! Construction of `IndexableItem`s from raw and source-side data.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use search_sync_shared::{ContentRecord, ItemStatus};

use crate::errors::InvalidItemDataError;
use crate::item::IndexableItem;
use crate::registry::{TypeDefinition, TypeRegistry, ENTRY};

/// An input entry `create_batch_with_report` dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Position in the input list.
    pub index: usize,
    pub error: InvalidItemDataError,
}

/// Items built from a list, plus the entries that were skipped.
#[derive(Debug, Clone, Default)]
pub struct BatchCreation {
    pub items: Vec<IndexableItem>,
    pub skipped: Vec<SkippedEntry>,
}

/// Builds items against a type registry.
#[derive(Debug, Clone)]
pub struct IndexableItemFactory {
    registry: Arc<TypeRegistry>,
}

impl IndexableItemFactory {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Build an item from a raw key/value object.
    ///
    /// `elementId` and `siteId` must be positive integers (numeric strings are
    /// accepted). Only the attributes the type declares are copied, and only
    /// when present.
    pub fn create_from_raw(
        &self,
        type_name: &str,
        raw: &Value,
    ) -> Result<IndexableItem, InvalidItemDataError> {
        let definition = self.definition(type_name)?;
        let Some(raw) = raw.as_object() else {
            return Err(InvalidItemDataError::new("rawData", "must be an object"));
        };

        Ok(IndexableItem {
            item_id: positive_id(raw, "elementId")?,
            site_id: positive_id(raw, "siteId")?,
            type_name: definition.name().to_string(),
            title: optional_string(raw, "title").unwrap_or_default(),
            slug: optional_string(raw, "slug"),
            uri: optional_string(raw, "uri"),
            url: optional_string(raw, "url"),
            status: status(raw)?,
            created_at: timestamp(raw, "dateCreated")?,
            updated_at: timestamp(raw, "dateUpdated")?,
            attributes: declared_attributes(definition, raw),
        })
    }

    /// Build an item from a record handed out by a content source.
    pub fn create_from_source_object(
        &self,
        record: &ContentRecord,
    ) -> Result<IndexableItem, InvalidItemDataError> {
        let definition = self.definition(&record.type_name)?;
        if record.item_id == 0 {
            return Err(InvalidItemDataError::new("elementId", "must be a positive integer"));
        }
        if record.site_id == 0 {
            return Err(InvalidItemDataError::new("siteId", "must be a positive integer"));
        }

        let mut source = record.attributes.clone();
        if definition.name() == ENTRY {
            insert_absent(&mut source, "sectionHandle", record.section_handle.clone());
            insert_absent(&mut source, "typeHandle", record.type_handle.clone());
        }
        if let Some(variant) = record.variants.first() {
            insert_absent(&mut source, "sku", Some(variant.sku.clone()));
            insert_absent(&mut source, "price", Some(variant.price));
            insert_absent(&mut source, "promotionalPrice", variant.promotional_price);
            insert_absent(&mut source, "stock", variant.stock);
        }

        Ok(IndexableItem {
            item_id: record.item_id,
            site_id: record.site_id,
            type_name: definition.name().to_string(),
            title: record.title.clone().unwrap_or_default(),
            slug: record.slug.clone(),
            uri: record.uri.clone(),
            url: record.url.clone(),
            status: Some(record.status),
            created_at: record.created_at,
            updated_at: record.updated_at,
            attributes: declared_attributes(definition, &source),
        })
    }

    /// Build every valid entry of `raws`. Invalid entries are skipped
    /// silently; use `create_batch_with_report` to learn which.
    pub fn create_batch(&self, type_name: &str, raws: &[Value]) -> Vec<IndexableItem> {
        self.create_batch_with_report(type_name, raws).items
    }

    pub fn create_batch_with_report(&self, type_name: &str, raws: &[Value]) -> BatchCreation {
        let mut creation = BatchCreation::default();
        for (index, raw) in raws.iter().enumerate() {
            match self.create_from_raw(type_name, raw) {
                Ok(item) => creation.items.push(item),
                Err(error) => {
                    debug!(index, error = %error, "Skipping invalid batch entry");
                    creation.skipped.push(SkippedEntry { index, error });
                }
            }
        }
        creation
    }

    fn definition(&self, type_name: &str) -> Result<&TypeDefinition, InvalidItemDataError> {
        self.registry
            .get(type_name)
            .ok_or_else(|| InvalidItemDataError::new("typeName", format!("unknown type {type_name:?}")))
    }
}

fn insert_absent<T: Into<Value>>(map: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        map.entry(key.to_string()).or_insert_with(|| value.into());
    }
}

fn declared_attributes(definition: &TypeDefinition, raw: &Map<String, Value>) -> Map<String, Value> {
    definition
        .attributes()
        .iter()
        .filter_map(|name| match raw.get(name) {
            Some(Value::Null) | None => None,
            Some(value) => Some((name.clone(), value.clone())),
        })
        .collect()
}

fn positive_id(raw: &Map<String, Value>, field: &str) -> Result<u64, InvalidItemDataError> {
    let id = match raw.get(field) {
        None | Some(Value::Null) => {
            return Err(InvalidItemDataError::new(field, "is required"));
        }
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        Some(_) => None,
    };

    match id {
        Some(id) if id > 0 => Ok(id),
        _ => Err(InvalidItemDataError::new(field, "must be a positive integer")),
    }
}

fn optional_string(raw: &Map<String, Value>, field: &str) -> Option<String> {
    match raw.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn status(raw: &Map<String, Value>) -> Result<Option<ItemStatus>, InvalidItemDataError> {
    match raw.get("status") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => ItemStatus::parse(s)
            .map(Some)
            .ok_or_else(|| InvalidItemDataError::new("status", format!("unknown status {s:?}"))),
        Some(_) => Err(InvalidItemDataError::new("status", "must be a string")),
    }
}

/// RFC 3339 strings or Unix seconds.
fn timestamp(
    raw: &Map<String, Value>,
    field: &str,
) -> Result<Option<DateTime<Utc>>, InvalidItemDataError> {
    let invalid = || InvalidItemDataError::new(field, "must be an RFC 3339 timestamp or Unix seconds");
    match raw.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|_| invalid()),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .map(Some)
            .ok_or_else(invalid),
        Some(_) => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{HostModules, PRODUCT};
    use search_sync_shared::Variant;
    use serde_json::json;

    fn factory() -> IndexableItemFactory {
        IndexableItemFactory::new(Arc::new(TypeRegistry::with_modules(HostModules {
            commerce: true,
            digital_products: false,
        })))
    }

    #[test]
    fn test_create_from_raw() {
        let item = factory()
            .create_from_raw(
                "entry",
                &json!({
                    "elementId": 12,
                    "siteId": "1",
                    "title": "Winter boots",
                    "slug": "winter-boots",
                    "status": "LIVE",
                    "dateUpdated": "2024-03-01T10:00:00Z",
                    "sectionHandle": "blog",
                    "width": 400,
                    "typeHandle": null,
                }),
            )
            .unwrap();

        assert_eq!(item.item_id(), 12);
        assert_eq!(item.site_id(), 1);
        assert_eq!(item.status(), Some(ItemStatus::Live));
        assert!(item.updated_at().is_some());
        // undeclared and null attributes are not copied
        assert_eq!(item.attributes().len(), 1);
        assert_eq!(item.attributes()["sectionHandle"], "blog");
    }

    #[test]
    fn test_rejections_name_the_field() {
        let factory = factory();
        let cases = [
            ("entry", json!({"siteId": 1}), "elementId"),
            ("entry", json!({"elementId": 0, "siteId": 1}), "elementId"),
            ("entry", json!({"elementId": -4, "siteId": 1}), "elementId"),
            ("entry", json!({"elementId": 1, "siteId": "x"}), "siteId"),
            ("entry", json!({"elementId": 1, "siteId": 1, "status": "gone"}), "status"),
            ("entry", json!({"elementId": 1, "siteId": 1, "dateCreated": "yesterday"}), "dateCreated"),
            ("entry", json!([1, 2]), "rawData"),
            ("digital-product", json!({"elementId": 1, "siteId": 1}), "typeName"),
        ];

        for (type_name, raw, field) in cases {
            let err = factory.create_from_raw(type_name, &raw).unwrap_err();
            assert_eq!(err.field, field, "{raw}");
        }
    }

    #[test]
    fn test_batch_skips_invalid_entries() {
        let raws = vec![
            json!({"elementId": 1, "siteId": 1}),
            json!({"elementId": "nope", "siteId": 1}),
            json!({"elementId": 3, "siteId": 1}),
        ];
        let factory = factory();

        assert_eq!(factory.create_batch("asset", &raws).len(), 2);

        let creation = factory.create_batch_with_report("asset", &raws);
        assert_eq!(creation.items.len(), 2);
        assert_eq!(creation.skipped.len(), 1);
        assert_eq!(creation.skipped[0].index, 1);
        assert_eq!(creation.skipped[0].error.field, "elementId");
    }

    #[test]
    fn test_create_from_source_object() {
        let record = ContentRecord::new(5, 1, PRODUCT, ItemStatus::Live)
            .with_title("Parka")
            .with_attribute("productType", json!("clothing"))
            .with_attribute("internalNote", json!("skip me"))
            .with_variant(Variant {
                sku: "PARKA-M".to_string(),
                price: 220.0,
                promotional_price: None,
                stock: Some(4),
                unlimited_stock: false,
                shippable: true,
            });

        let item = factory().create_from_source_object(&record).unwrap();
        assert_eq!(item.title(), "Parka");
        assert_eq!(item.attributes()["sku"], "PARKA-M");
        assert_eq!(item.attributes()["stock"], 4);
        assert!(!item.attributes().contains_key("promotionalPrice"));
        assert!(!item.attributes().contains_key("internalNote"));
    }

    #[test]
    fn test_source_object_with_unknown_type() {
        let record = ContentRecord::new(5, 1, "widget", ItemStatus::Live);
        let err = factory().create_from_source_object(&record).unwrap_err();
        assert_eq!(err.field, "typeName");
    }
}
