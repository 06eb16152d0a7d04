use chrono::{DateTime, Utc};
use feed_datastore::SourceType;
use serde::Deserialize;

pub const YOUTUBE_VIDEO_BASE_URL: &str = "https://youtube.com/watch";

/// A video surfaced by a channel listing, not yet evaluated by the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub channel_name: String,
    pub description: String,
    pub duration_seconds: u64,
    pub privacy_status: PrivacyStatus,
}

impl Candidate {
    pub fn url(&self) -> String {
        format!("{YOUTUBE_VIDEO_BASE_URL}?v={}", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum PrivacyStatus {
    Public,
    Unlisted,
    Private,
    Other(String),
}

impl From<String> for PrivacyStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "public" => PrivacyStatus::Public,
            "unlisted" => PrivacyStatus::Unlisted,
            "private" => PrivacyStatus::Private,
            _ => PrivacyStatus::Other(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptMethod {
    Captions,
    AudioTranscription,
}

impl From<TranscriptMethod> for SourceType {
    fn from(method: TranscriptMethod) -> Self {
        match method {
            TranscriptMethod::Captions => SourceType::Captions,
            TranscriptMethod::AudioTranscription => SourceType::AudioTranscription,
        }
    }
}

/// The result of resolving a video's spoken content
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptOutcome {
    Text {
        content: String,
        method: TranscriptMethod,
    },
    /// Members-only or private content detected while resolving
    RestrictedAccess { reason: String },
    /// Every stage came up empty; `attempts` holds one reason per stage, in order
    Unavailable { attempts: Vec<String> },
}
