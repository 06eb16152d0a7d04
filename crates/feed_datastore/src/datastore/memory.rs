use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use crate::{datastore::DataStore, InsertOutcome, StoredSummary, SummaryRecord};

/// Process-local store with the same uniqueness contract as [`PgDataStore`].
/// Clones share the same records.
///
/// [`PgDataStore`]: crate::PgDataStore
#[derive(Debug, Clone, Default)]
pub struct MemoryDataStore {
    records: Arc<Mutex<Vec<StoredSummary>>>,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<StoredSummary>> {
        // a poisoned lock still holds consistent data; every write is a single push
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn records(&self) -> Vec<StoredSummary> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn get_by_video_id(&self, video_id: &str) -> Option<StoredSummary> {
        self.lock()
            .iter()
            .find(|s| s.record.video_id == video_id)
            .cloned()
    }
}

impl DataStore for MemoryDataStore {
    async fn insert_summary(&self, record: &SummaryRecord) -> anyhow::Result<InsertOutcome> {
        let mut records = self.lock();

        if records.iter().any(|s| s.record.video_id == record.video_id) {
            tracing::debug!(video_id = %record.video_id, "Summary already stored, skipping");
            return Ok(InsertOutcome::Duplicate);
        }

        let id = records.len() as i64 + 1;
        records.push(StoredSummary {
            id,
            processed_at: Utc::now(),
            record: record.clone(),
        });

        Ok(InsertOutcome::Inserted(id))
    }
}
