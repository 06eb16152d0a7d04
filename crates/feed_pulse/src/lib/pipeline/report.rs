use std::fmt;

use chrono::{DateTime, Utc};
use feed_datastore::SummaryRecord;

#[derive(Debug, Clone, PartialEq)]
pub enum FeedStatus {
    Checked { accepted: usize },
    NotFound,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct FeedReport {
    pub handle: String,
    pub status: FeedStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    AlreadyProcessed,
    Restricted(String),
    /// Carries the per-stage failure reasons
    NoTranscript(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct SkippedItem {
    pub video_id: String,
    pub title: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub struct StoreFailure {
    pub video_id: String,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct DigestDelivery {
    pub sink: String,
    pub location: String,
}

/// What a single pipeline run did, feed by feed
#[derive(Debug, Clone)]
pub struct RunReport {
    pub profile: String,
    pub started_at: DateTime<Utc>,
    pub feeds: Vec<FeedReport>,
    pub skipped: Vec<SkippedItem>,
    pub summaries: Vec<SummaryRecord>,
    pub store_failures: Vec<StoreFailure>,
    pub deliveries: Vec<DigestDelivery>,
    pub cancelled: bool,
}

impl RunReport {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            started_at: Utc::now(),
            feeds: Vec::new(),
            skipped: Vec::new(),
            summaries: Vec::new(),
            store_failures: Vec::new(),
            deliveries: Vec::new(),
            cancelled: false,
        }
    }

    pub fn new_items(&self) -> usize {
        self.summaries.len()
    }

    pub fn skipped_with(&self, matches: impl Fn(&SkipReason) -> bool) -> usize {
        self.skipped.iter().filter(|s| matches(&s.reason)).count()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Run for profile '{}' started {}",
            self.profile,
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;

        for feed in &self.feeds {
            match &feed.status {
                FeedStatus::Checked { accepted } => {
                    writeln!(f, "  {}: {accepted} candidate(s)", feed.handle)?
                }
                FeedStatus::NotFound => writeln!(f, "  {}: channel not found", feed.handle)?,
                FeedStatus::Failed(reason) => writeln!(f, "  {}: failed: {reason}", feed.handle)?,
            }
        }

        for item in &self.skipped {
            match &item.reason {
                SkipReason::AlreadyProcessed => {}
                SkipReason::Restricted(reason) => {
                    writeln!(f, "  skipped {} (restricted: {reason})", item.video_id)?
                }
                SkipReason::NoTranscript(_) => {
                    writeln!(f, "  skipped {} (no transcript)", item.video_id)?
                }
            }
        }

        for failure in &self.store_failures {
            writeln!(f, "  store failed for {}: {}", failure.video_id, failure.error)?;
        }

        for delivery in &self.deliveries {
            writeln!(f, "  digest sent via {}: {}", delivery.sink, delivery.location)?;
        }

        if self.cancelled {
            writeln!(f, "  cancelled before all feeds were checked")?;
        }

        write!(
            f,
            "{} new summary(ies), {} already processed",
            self.new_items(),
            self.skipped_with(|r| *r == SkipReason::AlreadyProcessed)
        )
    }
}
