#![allow(dead_code)]

pub mod audio_fetcher;
pub mod caption_source;
pub mod datastore;
pub mod digest_sink;
pub mod feed_source;
pub mod state_file;
pub mod summarizer;
pub mod transcriber;

use chrono::{Duration, TimeZone, Utc};
use feed_pulse::{
    types::{Candidate, PrivacyStatus},
    yt::CaptionTrack,
};

pub fn candidate(id: &str, privacy_status: PrivacyStatus) -> Candidate {
    Candidate {
        id: id.to_string(),
        title: format!("Video {id}"),
        published_at: Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap() - Duration::hours(1),
        channel_name: "FinTek".into(),
        description: "Short".into(),
        duration_seconds: 933,
        privacy_status,
    }
}

pub fn public(id: &str) -> Candidate {
    candidate(id, PrivacyStatus::Public)
}

pub fn with_description(mut candidate: Candidate, description: &str) -> Candidate {
    candidate.description = description.to_string();
    candidate
}

pub const LONG_DESCRIPTION: &str =
    "In this video we break down the latest rate decision, what it means for mortgage holders, and three stocks to watch.";

pub fn track(video_id: &str, language_code: &str, is_generated: bool) -> CaptionTrack {
    let kind = if is_generated { "asr" } else { "manual" };
    CaptionTrack {
        language_code: language_code.to_string(),
        name: language_code.to_string(),
        is_generated,
        is_translatable: true,
        locator: format!("{video_id}/{language_code}/{kind}"),
    }
}
