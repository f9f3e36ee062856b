//! The canonical unit of indexing.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use search_sync_shared::{IndexDocument, ItemStatus};

/// A validated content item ready to be turned into a search document.
///
/// Only `IndexableItemFactory` builds these, so `item_id` and `site_id` are
/// always positive and `type_name` is a registered type.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexableItem {
    pub(crate) item_id: u64,
    pub(crate) site_id: u64,
    pub(crate) type_name: String,
    pub(crate) title: String,
    pub(crate) slug: Option<String>,
    pub(crate) uri: Option<String>,
    pub(crate) url: Option<String>,
    pub(crate) status: Option<ItemStatus>,
    pub(crate) created_at: Option<DateTime<Utc>>,
    pub(crate) updated_at: Option<DateTime<Utc>>,
    pub(crate) attributes: Map<String, Value>,
}

impl IndexableItem {
    pub fn item_id(&self) -> u64 {
        self.item_id
    }

    pub fn site_id(&self) -> u64 {
        self.site_id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn status(&self) -> Option<ItemStatus> {
        self.status
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Type-specific attributes. Only those present on the input are set.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn object_id(&self) -> String {
        IndexDocument::object_id_for(&self.type_name, self.site_id, self.item_id)
    }

    /// Full document, with fetched page content when there is some.
    pub fn to_document(&self, content: Option<String>, indexed_at: DateTime<Utc>) -> IndexDocument {
        IndexDocument {
            object_id: self.object_id(),
            item_id: self.item_id,
            site_id: self.site_id,
            type_name: self.type_name.clone(),
            title: self.title.clone(),
            url: self.url.clone(),
            slug: self.slug.clone(),
            status: self.status,
            content,
            attributes: self.attributes.clone(),
            updated_at: self.updated_at,
            minimal: false,
            indexed_at,
        }
    }

    /// Degraded document: identity, title and URL only.
    pub fn to_minimal_document(&self, indexed_at: DateTime<Utc>) -> IndexDocument {
        IndexDocument {
            object_id: self.object_id(),
            item_id: self.item_id,
            site_id: self.site_id,
            type_name: self.type_name.clone(),
            title: self.title.clone(),
            url: self.url.clone(),
            slug: None,
            status: None,
            content: None,
            attributes: Map::new(),
            updated_at: None,
            minimal: true,
            indexed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item() -> IndexableItem {
        let mut attributes = Map::new();
        attributes.insert("sectionHandle".to_string(), json!("blog"));
        IndexableItem {
            item_id: 7,
            site_id: 2,
            type_name: "entry".to_string(),
            title: "Winter boots".to_string(),
            slug: Some("winter-boots".to_string()),
            uri: Some("blog/winter-boots".to_string()),
            url: Some("https://example.com/blog/winter-boots".to_string()),
            status: Some(ItemStatus::Live),
            created_at: None,
            updated_at: None,
            attributes,
        }
    }

    #[test]
    fn test_full_document() {
        let now = Utc::now();
        let doc = item().to_document(Some("body".to_string()), now);
        assert_eq!(doc.object_id, "entry_2_7");
        assert_eq!(doc.content.as_deref(), Some("body"));
        assert_eq!(doc.attributes["sectionHandle"], "blog");
        assert!(!doc.minimal);
    }

    #[test]
    fn test_minimal_document_keeps_identity_title_and_url() {
        let doc = item().to_minimal_document(Utc::now());
        assert!(doc.minimal);
        assert_eq!(doc.title, "Winter boots");
        assert!(doc.url.is_some());
        assert!(doc.slug.is_none());
        assert!(doc.attributes.is_empty());
    }
}
