use std::future::Future;

use crate::SummaryRecord;

pub mod memory;
pub mod postgres;

pub trait DataStore {
    /// Persists a summary. A record whose `video_id` is already stored is left
    /// untouched and reported as [`InsertOutcome::Duplicate`].
    fn insert_summary(
        &self,
        record: &SummaryRecord,
    ) -> impl Future<Output = anyhow::Result<InsertOutcome>> + Send;
}

impl<T: DataStore + Send + Sync> DataStore for &T {
    async fn insert_summary(&self, record: &SummaryRecord) -> anyhow::Result<InsertOutcome> {
        (**self).insert_summary(record).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Row id of the new record
    Inserted(i64),
    Duplicate,
}

impl InsertOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, InsertOutcome::Duplicate)
    }
}
