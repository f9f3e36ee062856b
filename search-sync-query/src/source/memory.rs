//! In-memory content source.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ContentSource, QueryResolutionError};
use crate::filter::FilterCriteria;
use search_sync_shared::{BatchJob, ContentRecord};

/// Content source backed by a vector of records.
///
/// Used by the CLI for file-based content and by tests.
#[derive(Debug, Default)]
pub struct MemoryContentSource {
    records: RwLock<Vec<ContentRecord>>,
}

impl MemoryContentSource {
    pub fn new(records: Vec<ContentRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Insert or replace a record, keyed by item and site.
    pub async fn upsert(&self, record: ContentRecord) {
        let mut records = self.records.write().await;
        match records
            .iter_mut()
            .find(|r| r.item_id == record.item_id && r.site_id == record.site_id)
        {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

fn job_for(record: &ContentRecord) -> BatchJob {
    BatchJob::new(record.item_id, record.site_id, record.type_name.clone())
}

#[async_trait]
impl ContentSource for MemoryContentSource {
    async fn count(&self, criteria: &FilterCriteria) -> Result<u64, QueryResolutionError> {
        let predicates = criteria.predicates();
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| predicates.iter().all(|p| p.matches(r)))
            .count() as u64)
    }

    async fn find_jobs(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<Vec<BatchJob>, QueryResolutionError> {
        let predicates = criteria.predicates();
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| predicates.iter().all(|p| p.matches(r)))
            .map(job_for)
            .collect())
    }

    async fn fetch(&self, job: &BatchJob) -> Result<Option<ContentRecord>, QueryResolutionError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|r| r.item_id == job.item_id && r.site_id == job.site_id)
            .cloned())
    }

    async fn children(&self, job: &BatchJob) -> Result<Vec<BatchJob>, QueryResolutionError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.parent_id == Some(job.item_id) && r.site_id == job.site_id)
            .map(job_for)
            .collect())
    }
}
