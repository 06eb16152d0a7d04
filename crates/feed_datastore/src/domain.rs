use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::Serialize;

/// Provenance of the text a summary was produced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Captions,
    AudioTranscription,
    DescriptionOnly,
    UnavailableNotice,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Captions => "captions",
            SourceType::AudioTranscription => "audio_transcription",
            SourceType::DescriptionOnly => "description_only",
            SourceType::UnavailableNotice => "unavailable_notice",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSourceType(pub String);

impl fmt::Display for UnknownSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown source type '{}'", self.0)
    }
}

impl std::error::Error for UnknownSourceType {}

impl FromStr for SourceType {
    type Err = UnknownSourceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "captions" => Ok(SourceType::Captions),
            "audio_transcription" => Ok(SourceType::AudioTranscription),
            "description_only" => Ok(SourceType::DescriptionOnly),
            "unavailable_notice" => Ok(SourceType::UnavailableNotice),
            other => Err(UnknownSourceType(other.to_string())),
        }
    }
}

/// The persisted output unit of one pipeline pass over a video.
///
/// `key_topics`, `recommendations` and `action_items` are reserved for structured
/// extraction and are written as `NULL` today.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRecord {
    pub video_id: String,
    pub channel_name: String,
    pub title: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub duration_seconds: i64,
    pub source_type: SourceType,
    pub summary_text: String,
    pub key_topics: Option<String>,
    pub recommendations: Option<String>,
    pub action_items: Option<String>,
}

/// A summary as read back from the store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredSummary {
    pub id: i64,
    pub processed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: SummaryRecord,
}

#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Full-text query; `None` lists by the remaining filters only
    pub term: Option<String>,
    pub from: Option<DateTime<Utc>>,
    /// Case-insensitive substring match on the channel name
    pub channel: Option<String>,
    pub limit: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelCount {
    pub name: String,
    pub video_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub earliest: DateTime<Utc>,
    pub latest: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub total_videos: i64,
    pub date_range: Option<DateRange>,
    pub by_channel: Vec<ChannelCount>,
    pub by_source: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelDigest {
    pub name: String,
    pub video_count: usize,
    pub videos: Vec<StoredSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Digest {
    pub days: u32,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub total_videos: usize,
    pub total_channels: usize,
    pub channels: Vec<ChannelDigest>,
}

/// Groups summaries by channel, keeping each channel's input order, and orders
/// channels by video count descending. Ties keep first-appearance order.
pub fn build_digest(
    summaries: Vec<StoredSummary>,
    days: u32,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Digest {
    let total_videos = summaries.len();

    let mut grouped: Vec<ChannelDigest> = Vec::new();
    for summary in summaries {
        let name = summary.record.channel_name.clone();
        match grouped.iter_mut().find(|c| c.name == name) {
            Some(channel) => channel.videos.push(summary),
            None => grouped.push(ChannelDigest {
                name,
                video_count: 0,
                videos: vec![summary],
            }),
        }
    }

    let channels = grouped
        .into_iter()
        .map(|mut c| {
            c.video_count = c.videos.len();
            c
        })
        .sorted_by(|a, b| b.video_count.cmp(&a.video_count))
        .collect::<Vec<_>>();

    Digest {
        days,
        from,
        to,
        total_videos,
        total_channels: channels.len(),
        channels,
    }
}
