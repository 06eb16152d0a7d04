use std::sync::{Arc, Mutex};

use feed_datastore::{DataStore, InsertOutcome, SummaryRecord};

/// A store whose every write fails
#[derive(Clone, Default)]
pub struct FailingDataStore {
    pub attempts: Arc<Mutex<Vec<String>>>,
}

impl DataStore for FailingDataStore {
    async fn insert_summary(&self, record: &SummaryRecord) -> anyhow::Result<InsertOutcome> {
        self.attempts.lock().unwrap().push(record.video_id.clone());
        anyhow::bail!("connection refused")
    }
}
