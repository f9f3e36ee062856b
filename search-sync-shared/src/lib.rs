//! # Search Sync Shared
//!
//! Plain data types exchanged between the content source, the indexing
//! pipeline and the search engine client.

mod batch;
mod content;
mod document;
mod search;
mod status;

pub use batch::{BatchJob, FailureRecord, PartialRecord};
pub use content::{ContentRecord, Variant};
pub use document::IndexDocument;
pub use search::{IndexStats, SearchHit, SearchQuery, SearchResponse};
pub use status::ItemStatus;
