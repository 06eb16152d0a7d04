use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use feed_pulse::{types::Candidate, yt::FeedSource};

const FEED_ID_PREFIX: &str = "UC-";

#[derive(Clone, Default)]
pub struct MockFeedSource {
    feeds: HashMap<String, Vec<Candidate>>,
    failing_listings: HashSet<String>,
    pub resolve_calls: Arc<Mutex<Vec<String>>>,
    pub list_calls: Arc<Mutex<Vec<(String, usize)>>>,
}

impl MockFeedSource {
    pub fn with_feed(mut self, handle: &str, candidates: Vec<Candidate>) -> Self {
        self.feeds.insert(handle.to_string(), candidates);
        self
    }

    /// The handle resolves but listing its videos fails
    pub fn with_failing_listing(mut self, handle: &str) -> Self {
        self.failing_listings.insert(handle.to_string());
        self
    }
}

impl FeedSource for MockFeedSource {
    async fn resolve_feed_id(&self, handle: &str) -> anyhow::Result<Option<String>> {
        self.resolve_calls.lock().unwrap().push(handle.to_string());
        let known = self.feeds.contains_key(handle) || self.failing_listings.contains(handle);
        Ok(known.then(|| format!("{FEED_ID_PREFIX}{handle}")))
    }

    async fn list_candidates(
        &self,
        feed_id: &str,
        max_results: usize,
    ) -> anyhow::Result<Vec<Candidate>> {
        self.list_calls
            .lock()
            .unwrap()
            .push((feed_id.to_string(), max_results));

        let handle = feed_id.trim_start_matches(FEED_ID_PREFIX);
        if self.failing_listings.contains(handle) {
            anyhow::bail!("API error: 403 - quotaExceeded");
        }

        Ok(self
            .feeds
            .get(handle)
            .map(|c| c.iter().take(max_results).cloned().collect())
            .unwrap_or_default())
    }
}
