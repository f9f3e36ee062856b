//! Search engine document shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::status::ItemStatus;

/// Document sent to the search engine for one item on one site.
///
/// A `minimal` document only carries identity, title and URL; it is produced
/// when enrichment failed and the item is indexed in degraded form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDocument {
    pub object_id: String,
    pub item_id: u64,
    pub site_id: u64,
    pub type_name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub minimal: bool,
    pub indexed_at: DateTime<Utc>,
}

impl IndexDocument {
    /// Document id: `{type}_{site}_{item}`. Unique across kinds and sites.
    pub fn object_id_for(type_name: &str, site_id: u64, item_id: u64) -> String {
        format!("{}_{}_{}", type_name, site_id, item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id() {
        assert_eq!(IndexDocument::object_id_for("entry", 2, 41), "entry_2_41");
    }
}
