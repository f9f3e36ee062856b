//! Content loaded from a JSON file.
//!
//! The file holds an array of content records in their camelCase form:
//!
//! ```json
//! [{"itemId": 1, "siteId": 1, "typeName": "entry", "status": "live",
//!   "title": "Winter boots", "url": "https://example.com/winter-boots"}]
//! ```

use std::path::Path;

use tracing::info;

use search_sync_query::MemoryContentSource;
use search_sync_shared::ContentRecord;

use crate::AppError;

pub fn parse_content(json: &str) -> Result<Vec<ContentRecord>, AppError> {
    Ok(serde_json::from_str(json)?)
}

pub async fn load_content_file(path: &Path) -> Result<MemoryContentSource, AppError> {
    let json = tokio::fs::read_to_string(path).await?;
    let records = parse_content(&json)?;
    info!(path = %path.display(), records = records.len(), "Loaded content file");
    Ok(MemoryContentSource::new(records))
}
