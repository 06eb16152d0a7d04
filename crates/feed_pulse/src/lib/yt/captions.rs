//! Caption tracks discovered through yt-dlp metadata and fetched in YouTube's `json3`
//! timed-text format.

use anyhow::Context;
use serde_json::Value;

use crate::{
    types::YOUTUBE_VIDEO_BASE_URL,
    yt::{ytdlp::YtDlp, CaptionSegment, CaptionSource, CaptionTrack},
};

const CAPTION_FORMAT: &str = "json3";
/// Suffix yt-dlp gives the untranslated ASR track
const ORIGINAL_TRACK_SUFFIX: &str = "-orig";

#[derive(Debug, Clone)]
pub struct YtDlpCaptions {
    yt_dlp: YtDlp,
    http_client: reqwest::Client,
}

impl YtDlpCaptions {
    pub fn new(yt_dlp: YtDlp) -> Self {
        Self {
            yt_dlp,
            http_client: reqwest::Client::new(),
        }
    }

    async fn fetch_json3(&self, url: &str) -> anyhow::Result<Vec<CaptionSegment>> {
        let body = self
            .http_client
            .get(url)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await
            .context("Caption track is not valid json3")?;

        Ok(parse_json3(&body))
    }
}

impl CaptionSource for YtDlpCaptions {
    #[tracing::instrument(skip(self))]
    async fn list_tracks(&self, video_id: &str) -> anyhow::Result<Vec<CaptionTrack>> {
        let url = format!("{YOUTUBE_VIDEO_BASE_URL}?v={video_id}");
        let metadata = self.yt_dlp.dump_metadata(&url).await?;
        Ok(parse_caption_tracks(&metadata))
    }

    #[tracing::instrument(skip_all, fields(language = %track.language_code))]
    async fn fetch_track(&self, track: &CaptionTrack) -> anyhow::Result<Vec<CaptionSegment>> {
        self.fetch_json3(&track.locator).await
    }

    #[tracing::instrument(skip_all, fields(from = %track.language_code, to = %language_code))]
    async fn fetch_translated(
        &self,
        track: &CaptionTrack,
        language_code: &str,
    ) -> anyhow::Result<Vec<CaptionSegment>> {
        anyhow::ensure!(
            track.is_translatable,
            "caption track '{}' cannot be translated",
            track.language_code
        );
        let url = reqwest::Url::parse_with_params(&track.locator, &[("tlang", language_code)])
            .context("Invalid caption track url")?;
        self.fetch_json3(url.as_str()).await
    }
}

/// Collects uploader tracks from `subtitles` and the untranslated ASR tracks from
/// `automatic_captions`. Machine-translated ASR variants are left out; translation
/// is requested explicitly through [`CaptionSource::fetch_translated`].
pub fn parse_caption_tracks(metadata: &Value) -> Vec<CaptionTrack> {
    let mut tracks = Vec::new();

    if let Some(subtitles) = metadata["subtitles"].as_object() {
        for (language_code, formats) in subtitles {
            if language_code == "live_chat" {
                continue;
            }
            if let Some((name, url)) = json3_format(formats) {
                tracks.push(CaptionTrack {
                    language_code: language_code.clone(),
                    name,
                    is_generated: false,
                    is_translatable: true,
                    locator: url,
                });
            }
        }
    }

    if let Some(automatic) = metadata["automatic_captions"].as_object() {
        for (language_code, formats) in automatic {
            let Some((name, url)) = json3_format(formats) else {
                continue;
            };
            if url.contains("tlang=") {
                continue;
            }
            let language_code = language_code
                .strip_suffix(ORIGINAL_TRACK_SUFFIX)
                .unwrap_or(language_code)
                .to_string();
            if tracks
                .iter()
                .any(|t| t.is_generated && t.language_code == language_code)
            {
                continue;
            }
            tracks.push(CaptionTrack {
                language_code,
                name,
                is_generated: true,
                is_translatable: true,
                locator: url,
            });
        }
    }

    tracks
}

fn json3_format(formats: &Value) -> Option<(String, String)> {
    formats.as_array()?.iter().find_map(|f| {
        (f["ext"].as_str()? == CAPTION_FORMAT).then(|| {
            (
                f["name"].as_str().unwrap_or_default().to_string(),
                f["url"].as_str().unwrap_or_default().to_string(),
            )
        })
    })
    .filter(|(_, url)| !url.is_empty())
}

/// Flattens json3 `events[].segs[].utf8` into one segment per event
pub fn parse_json3(body: &Value) -> Vec<CaptionSegment> {
    let Some(events) = body["events"].as_array() else {
        return Vec::new();
    };

    events
        .iter()
        .filter_map(|event| {
            let text = event["segs"]
                .as_array()?
                .iter()
                .filter_map(|seg| seg["utf8"].as_str())
                .collect::<String>();
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                return None;
            }
            Some(CaptionSegment {
                start_ms: event["tStartMs"].as_u64().unwrap_or_default(),
                text,
            })
        })
        .collect()
}
