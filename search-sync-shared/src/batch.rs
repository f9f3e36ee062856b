//! Batch work units and per-item outcome records.

use serde::{Deserialize, Serialize};

/// One dispatched unit of indexing work: one item on one site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchJob {
    pub item_id: u64,
    pub site_id: u64,
    pub type_name: String,
}

impl BatchJob {
    pub fn new(item_id: u64, site_id: u64, type_name: impl Into<String>) -> Self {
        Self {
            item_id,
            site_id,
            type_name: type_name.into(),
        }
    }
}

/// An item whose indexing did not happen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureRecord {
    pub item_id: u64,
    pub site_id: u64,
    pub type_name: String,
    pub error: String,
}

/// An item indexed with minimal fields only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialRecord {
    pub item_id: u64,
    pub site_id: u64,
    pub type_name: String,
    pub reason: String,
}
