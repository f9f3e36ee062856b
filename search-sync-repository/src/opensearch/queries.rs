//! OpenSearch query builders.

use serde_json::{json, Value};

use search_sync_shared::SearchQuery;

/// Build an OpenSearch query body from a `SearchQuery`.
///
/// - Blank query text matches everything
/// - `bool_prefix` multi-match over the `search_as_you_type` title subfields
///   and the page content
/// - Site and type restrictions become non-scoring filters
pub fn build_search_query(query: &SearchQuery) -> Value {
    let text = query.query.trim();
    let must = if text.is_empty() {
        json!({ "match_all": {} })
    } else {
        json!({
            "multi_match": {
                "query": text,
                "type": "bool_prefix",
                "fields": ["title^3", "title._2gram", "title._3gram", "content"]
            }
        })
    };

    let mut filter = Vec::new();
    if let Some(site_id) = query.site_id {
        filter.push(json!({ "term": { "siteId": site_id } }));
    }
    if !query.type_names.is_empty() {
        filter.push(json!({ "terms": { "typeName": query.type_names } }));
    }

    json!({
        "query": {
            "bool": {
                "must": [must],
                "filter": filter
            }
        }
    })
}
