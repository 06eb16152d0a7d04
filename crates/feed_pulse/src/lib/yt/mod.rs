pub mod audio_handler;
pub mod captions;
pub mod data_api;
pub mod ytdlp;

use std::{
    future::Future,
    path::{Path, PathBuf},
};

use crate::types::Candidate;

/// Channel lookup and most-recent-first video listing
pub trait FeedSource {
    /// Resolves a channel handle (`@name`) to a stable channel id, `None` if unknown
    fn resolve_feed_id(
        &self,
        handle: &str,
    ) -> impl Future<Output = anyhow::Result<Option<String>>> + Send;

    fn list_candidates(
        &self,
        feed_id: &str,
        max_results: usize,
    ) -> impl Future<Output = anyhow::Result<Vec<Candidate>>> + Send;
}

pub trait CaptionSource {
    /// Lists the caption tracks of a video. Access restrictions surface as errors
    /// whose message carries the upstream reason.
    fn list_tracks(
        &self,
        video_id: &str,
    ) -> impl Future<Output = anyhow::Result<Vec<CaptionTrack>>> + Send;

    fn fetch_track(
        &self,
        track: &CaptionTrack,
    ) -> impl Future<Output = anyhow::Result<Vec<CaptionSegment>>> + Send;

    fn fetch_translated(
        &self,
        track: &CaptionTrack,
        language_code: &str,
    ) -> impl Future<Output = anyhow::Result<Vec<CaptionSegment>>> + Send;
}

pub trait AudioFetcher {
    /// Downloads the best available audio of a video into `dest_dir` and returns the
    /// path of the resulting file
    fn download(
        &self,
        video_id: &str,
        dest_dir: &Path,
    ) -> impl Future<Output = anyhow::Result<PathBuf>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrack {
    pub language_code: String,
    pub name: String,
    /// Auto-generated (ASR) rather than authored by the uploader
    pub is_generated: bool,
    pub is_translatable: bool,
    /// Source-specific handle used to fetch the track
    pub locator: String,
}

impl CaptionTrack {
    pub fn is_language(&self, language_code: &str) -> bool {
        self.language_code == language_code
            || self
                .language_code
                .strip_prefix(language_code)
                .is_some_and(|rest| rest.starts_with('-'))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptionSegment {
    pub start_ms: u64,
    pub text: String,
}
