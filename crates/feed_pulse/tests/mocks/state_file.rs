use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use feed_pulse::{tracker::ProcessedStateFile, Error, Result};

/// In-memory processed set shared between clones, standing in for a state file
#[derive(Clone, Default)]
pub struct MockStateFile {
    pub ids: Arc<Mutex<HashSet<String>>>,
    pub store_count: Arc<Mutex<usize>>,
    fail_store: bool,
}

impl MockStateFile {
    pub fn failing_store() -> Self {
        Self {
            fail_store: true,
            ..Default::default()
        }
    }

    pub fn stored_ids(&self) -> HashSet<String> {
        self.ids.lock().unwrap().clone()
    }

    pub fn stores(&self) -> usize {
        *self.store_count.lock().unwrap()
    }
}

impl ProcessedStateFile for MockStateFile {
    async fn load(&self) -> Result<HashSet<String>> {
        Ok(self.ids.lock().unwrap().clone())
    }

    async fn store(&self, ids: &HashSet<String>) -> Result<()> {
        if self.fail_store {
            return Err(Error::Io(std::io::Error::other("disk full")));
        }
        *self.ids.lock().unwrap() = ids.clone();
        *self.store_count.lock().unwrap() += 1;
        Ok(())
    }
}
