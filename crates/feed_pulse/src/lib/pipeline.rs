pub mod builder;
pub mod report;

use anyhow::Context;
use feed_datastore::{DataStore, InsertOutcome, SourceType, SummaryRecord};
use tokio_util::sync::CancellationToken;

use crate::{
    config::Profile,
    digest::{DigestSink, RunDigest},
    filter::{overfetch_size, select_candidates},
    resolver::ResolveTranscript,
    tracker::{ProcessedSetTracker, ProcessedStateFile},
    types::{Candidate, TranscriptOutcome},
    yt::FeedSource,
    Summarizer,
};
use report::{DigestDelivery, FeedReport, FeedStatus, RunReport, SkipReason, SkippedItem, StoreFailure};

pub const MAX_TRANSCRIPT_CHARS: usize = 100_000;
pub const TRUNCATION_MARKER: &str = "... [transcript truncated]";
pub const ERROR_NOTICE_PREFIX: &str = "⚠️ Error generating summary: ";
pub const LIMITED_INFO_PREFIX: &str =
    "⚠️ LIMITED INFO - Transcript not available, summary based on description only:\n\n";
/// Descriptions this short are not worth a summarization call
pub const MIN_DESCRIPTION_CHARS: usize = 50;

type Tracker<'a, P> = ProcessedSetTracker<&'a P>;

/// Polls every channel of a profile and summarizes videos it has not seen before
pub struct SummaryPipeline<F, R, S, D, P> {
    profile: Profile,
    feed_source: F,
    resolver: R,
    summarizer: S,
    store: D,
    processed_state: P,
    digest_sinks: Vec<Box<dyn DigestSink>>,
    cancellation_token: CancellationToken,
}

impl<F, R, S, D, P> SummaryPipeline<F, R, S, D, P>
where
    F: FeedSource + Send + Sync,
    R: ResolveTranscript + Send + Sync,
    S: Summarizer + Send + Sync,
    D: DataStore + Send + Sync,
    P: ProcessedStateFile + Send + Sync,
{
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Runs one pass over all channels.
    ///
    /// Per-feed and per-item failures are recorded in the report; only failing to
    /// load or persist the processed set fails the run.
    #[tracing::instrument(skip(self), fields(profile = %self.profile.name))]
    pub async fn run(&self) -> anyhow::Result<RunReport> {
        let mut tracker = ProcessedSetTracker::load(&self.processed_state)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to load processed state"))
            .context("Failed to load processed state")?;
        let mut report = RunReport::new(&self.profile.name);

        tracing::info!(
            channels = self.profile.channels.len(),
            already_processed = tracker.len(),
            "Checking channels"
        );

        for handle in &self.profile.channels {
            if self.cancellation_token.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let status = self.process_feed(handle, &mut tracker, &mut report).await;
            report.feeds.push(FeedReport {
                handle: handle.clone(),
                status,
            });
        }

        tracker
            .flush()
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to persist processed state"))
            .context("Failed to persist processed state")?;

        if report.summaries.is_empty() {
            tracing::info!("No new videos found");
        } else {
            self.emit_digest(&mut report).await;
        }

        tracing::info!(
            new_items = report.new_items(),
            cancelled = report.cancelled,
            "Run complete"
        );
        Ok(report)
    }

    #[tracing::instrument(skip(self, tracker, report))]
    async fn process_feed(
        &self,
        handle: &str,
        tracker: &mut Tracker<'_, P>,
        report: &mut RunReport,
    ) -> FeedStatus {
        let feed_id = match self.feed_source.resolve_feed_id(handle).await {
            Ok(Some(feed_id)) => feed_id,
            Ok(None) => {
                tracing::warn!("Channel not found");
                return FeedStatus::NotFound;
            }
            Err(e) => {
                tracing::error!(error = ?e, "Failed to resolve channel");
                return FeedStatus::Failed(format!("{e:#}"));
            }
        };

        let count = self.profile.videos_per_channel;
        let candidates = match self
            .feed_source
            .list_candidates(&feed_id, overfetch_size(count))
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::error!(error = ?e, %feed_id, "Failed to list videos");
                return FeedStatus::Failed(format!("{e:#}"));
            }
        };

        let accepted = select_candidates(candidates, count);
        let status = FeedStatus::Checked {
            accepted: accepted.len(),
        };

        for candidate in accepted {
            if self.cancellation_token.is_cancelled() {
                report.cancelled = true;
                break;
            }
            self.process_candidate(candidate, tracker, report).await;
        }

        status
    }

    #[tracing::instrument(skip_all, fields(video_id = %candidate.id))]
    async fn process_candidate(
        &self,
        candidate: Candidate,
        tracker: &mut Tracker<'_, P>,
        report: &mut RunReport,
    ) {
        if tracker.contains(&candidate.id) {
            tracing::debug!("Already processed");
            report.skipped.push(skipped(&candidate, SkipReason::AlreadyProcessed));
            return;
        }

        tracing::info!(title = %candidate.title, duration_seconds = candidate.duration_seconds, "New video");

        let (summary_text, source_type) = match self.resolver.resolve(&candidate.id).await {
            TranscriptOutcome::RestrictedAccess { reason } => {
                tracing::info!(%reason, "Skipping members-only video");
                tracker.mark_processed(candidate.id.clone());
                report.skipped.push(skipped(&candidate, SkipReason::Restricted(reason)));
                return;
            }
            TranscriptOutcome::Text { content, method } => (
                self.summarize_transcript(&candidate, &content).await,
                SourceType::from(method),
            ),
            TranscriptOutcome::Unavailable { attempts } if self.profile.skip_no_transcript => {
                tracing::info!(?attempts, "Skipping video without transcript");
                tracker.mark_processed(candidate.id.clone());
                report.skipped.push(skipped(&candidate, SkipReason::NoTranscript(attempts)));
                return;
            }
            TranscriptOutcome::Unavailable { attempts } => {
                tracing::info!(?attempts, "No transcript, falling back to description");
                (
                    self.summarize_description(&candidate).await,
                    SourceType::DescriptionOnly,
                )
            }
        };

        tracker.mark_processed(candidate.id.clone());

        let record = SummaryRecord {
            url: candidate.url(),
            duration_seconds: i64::try_from(candidate.duration_seconds).unwrap_or(i64::MAX),
            video_id: candidate.id,
            channel_name: candidate.channel_name,
            title: candidate.title,
            published_at: candidate.published_at,
            source_type,
            summary_text,
            key_topics: None,
            recommendations: None,
            action_items: None,
        };

        match self.store.insert_summary(&record).await {
            Ok(InsertOutcome::Inserted(id)) => tracing::debug!(id, "Summary stored"),
            Ok(InsertOutcome::Duplicate) => tracing::debug!("Summary already stored"),
            Err(e) => {
                tracing::error!(error = ?e, "Failed to store summary");
                report.store_failures.push(StoreFailure {
                    video_id: record.video_id.clone(),
                    error: format!("{e:#}"),
                });
            }
        }

        report.summaries.push(record);
    }

    async fn summarize_transcript(&self, candidate: &Candidate, transcript: &str) -> String {
        let transcript = truncate_transcript(transcript);
        let prompt = self.profile.render_summary_prompt(candidate, &transcript);

        match self.summarizer.summarize(&prompt).await {
            Ok(response) => response.summary,
            Err(e) => {
                tracing::error!(error = %e, "Failed to generate summary");
                format!("{ERROR_NOTICE_PREFIX}{e}")
            }
        }
    }

    async fn summarize_description(&self, candidate: &Candidate) -> String {
        if candidate.description.chars().count() > MIN_DESCRIPTION_CHARS {
            let prompt = self.profile.render_description_prompt(candidate);
            match self.summarizer.summarize(&prompt).await {
                Ok(response) => return format!("{LIMITED_INFO_PREFIX}{}", response.summary),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to generate description-based summary")
                }
            }
        }

        unavailable_notice(candidate)
    }

    async fn emit_digest(&self, report: &mut RunReport) {
        let digest = RunDigest::new(
            &self.profile.name,
            self.profile.timezone,
            report.summaries.clone(),
        );

        for sink in &self.digest_sinks {
            match sink.emit(&digest).await {
                Ok(location) => report.deliveries.push(DigestDelivery {
                    sink: sink.name().to_string(),
                    location,
                }),
                Err(e) => tracing::error!(sink = sink.name(), error = ?e, "Failed to emit digest"),
            }
        }
    }
}

fn skipped(candidate: &Candidate, reason: SkipReason) -> SkippedItem {
    SkippedItem {
        video_id: candidate.id.clone(),
        title: candidate.title.clone(),
        reason,
    }
}

/// Caps a transcript at [`MAX_TRANSCRIPT_CHARS`] characters, marking the cut
pub fn truncate_transcript(content: &str) -> String {
    match content.char_indices().nth(MAX_TRANSCRIPT_CHARS) {
        Some((idx, _)) => format!("{}{TRUNCATION_MARKER}", &content[..idx]),
        None => content.to_string(),
    }
}

/// Stored in place of a summary when neither a transcript nor a usable description
/// exists
pub fn unavailable_notice(candidate: &Candidate) -> String {
    format!(
        "⚠️ Unable to generate detailed summary - transcript and description not available

This video was recently published and may not have captions yet. Try checking back later or watch it directly:

Title: {}
Channel: {}
URL: {}

Recommendation: Watch the video directly to get the full analysis.",
        candidate.title,
        candidate.channel_name,
        candidate.url()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_transcript_counts_chars() {
        let exact = "é".repeat(MAX_TRANSCRIPT_CHARS);
        assert_eq!(truncate_transcript(&exact), exact);

        let long = format!("{exact}tail");
        let truncated = truncate_transcript(&long);
        assert!(truncated.ends_with(TRUNCATION_MARKER));
        assert_eq!(
            truncated.chars().count(),
            MAX_TRANSCRIPT_CHARS + TRUNCATION_MARKER.chars().count()
        );
        assert!(!truncated.contains("tail"));
    }
}
