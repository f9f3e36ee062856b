//! OpenSearch index configuration and mappings.
//!
//! Every `{prefix}_{site}_{type}` index is created with these settings the
//! first time a document is written to it.

use serde_json::{json, Value};

/// Get the index settings and mappings for a content index.
///
/// The configuration includes:
/// - **search_as_you_type** on `title` for autocomplete, with a keyword copy
/// - **text** on `content` for the enriched page body
/// - **Keyword fields** for filtering and exact ID lookups
pub fn get_index_settings() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "properties": {
                "objectId": { "type": "keyword" },
                "itemId": { "type": "long" },
                "siteId": { "type": "long" },
                "typeName": { "type": "keyword" },
                "title": {
                    "type": "search_as_you_type",
                    "fields": {
                        "raw": { "type": "keyword" }
                    }
                },
                "slug": { "type": "keyword" },
                "url": { "type": "keyword", "index": false },
                "status": { "type": "keyword" },
                "content": { "type": "text" },
                "attributes": { "type": "object", "dynamic": true },
                "minimal": { "type": "boolean" },
                "updatedAt": { "type": "date" },
                "indexedAt": { "type": "date" }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_settings_structure() {
        let settings = get_index_settings();

        assert!(settings["settings"]["number_of_shards"].is_number());
        assert!(settings["settings"]["number_of_replicas"].is_number());

        let properties = &settings["mappings"]["properties"];
        assert_eq!(properties["title"]["type"], "search_as_you_type");
        assert_eq!(properties["objectId"]["type"], "keyword");
        assert_eq!(properties["siteId"]["type"], "long");
        assert_eq!(properties["content"]["type"], "text");
    }
}
