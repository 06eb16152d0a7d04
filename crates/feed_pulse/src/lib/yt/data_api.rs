//! Channel lookup and video listing through the YouTube Data API v3.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    duration::parse_duration,
    types::{Candidate, PrivacyStatus},
    yt::FeedSource,
};

static CHANNEL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^UC[A-Za-z0-9_-]{22}$").expect("valid channel id regex"));

/// `UC` followed by 22 url-safe characters
pub fn is_channel_id(value: &str) -> bool {
    CHANNEL_ID.is_match(value)
}

/// The `forHandle` lookup value for a configured channel, `@` prefixed
pub fn handle_query(handle: &str) -> String {
    if handle.starts_with('@') {
        handle.to_string()
    } else {
        format!("@{handle}")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum YouTubeApiError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Clone)]
pub struct YouTubeDataApi {
    client: Client,
    api_key: String,
    base_url: String,
}

impl YouTubeDataApi {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://www.googleapis.com/youtube/v3".into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn get<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, &str)],
    ) -> Result<T, YouTubeApiError> {
        let resp = self
            .client
            .get(format!("{}/{resource}", self.base_url))
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(YouTubeApiError::Api { status, message });
        }

        Ok(resp.json::<T>().await?)
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    pub id: String,
    pub snippet: VideoSnippet,
    #[serde(default)]
    pub content_details: ContentDetails,
    #[serde(default)]
    pub status: VideoStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub channel_title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContentDetails {
    #[serde(default)]
    pub duration: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatus {
    #[serde(default = "public")]
    pub privacy_status: PrivacyStatus,
}

fn public() -> PrivacyStatus {
    PrivacyStatus::Public
}

impl Default for VideoStatus {
    fn default() -> Self {
        Self {
            privacy_status: public(),
        }
    }
}

impl From<VideoItem> for Candidate {
    fn from(item: VideoItem) -> Self {
        Candidate {
            duration_seconds: parse_duration(&item.content_details.duration),
            id: item.id,
            title: item.snippet.title,
            published_at: item.snippet.published_at,
            channel_name: item.snippet.channel_title,
            description: item.snippet.description,
            privacy_status: item.status.privacy_status,
        }
    }
}

/// Orders video details by the search ranking (most recent first); ids the details
/// call did not return are dropped
pub fn candidates_in_search_order(order: &[String], mut items: Vec<VideoItem>) -> Vec<Candidate> {
    order
        .iter()
        .filter_map(|id| {
            let idx = items.iter().position(|item| &item.id == id)?;
            Some(Candidate::from(items.swap_remove(idx)))
        })
        .collect()
}

impl FeedSource for YouTubeDataApi {
    #[tracing::instrument(skip(self))]
    async fn resolve_feed_id(&self, handle: &str) -> anyhow::Result<Option<String>> {
        if is_channel_id(handle) {
            return Ok(Some(handle.to_string()));
        }

        let handle = handle_query(handle);

        let resp = self
            .get::<ListResponse<ChannelItem>>("channels", &[("part", "id"), ("forHandle", &handle)])
            .await?;

        Ok(resp.items.into_iter().next().map(|c| c.id))
    }

    #[tracing::instrument(skip(self))]
    async fn list_candidates(
        &self,
        feed_id: &str,
        max_results: usize,
    ) -> anyhow::Result<Vec<Candidate>> {
        let max_results = max_results.to_string();
        let search = self
            .get::<ListResponse<SearchItem>>(
                "search",
                &[
                    ("part", "snippet"),
                    ("channelId", feed_id),
                    ("type", "video"),
                    ("order", "date"),
                    ("maxResults", &max_results),
                ],
            )
            .await?;

        let video_ids = search
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .collect::<Vec<_>>();

        if video_ids.is_empty() {
            return Ok(Vec::new());
        }

        let details = self
            .get::<ListResponse<VideoItem>>(
                "videos",
                &[
                    ("part", "contentDetails,status,snippet"),
                    ("id", &video_ids.join(",")),
                ],
            )
            .await?;

        Ok(candidates_in_search_order(&video_ids, details.items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn video_json(id: &str, privacy: Option<&str>) -> serde_json::Value {
        let mut video = json!({
            "id": id,
            "snippet": {
                "title": format!("Title {id}"),
                "publishedAt": "2026-10-14T15:30:00Z",
                "channelTitle": "FinTek",
                "description": "A long enough description"
            },
            "contentDetails": { "duration": "PT15M33S" },
            "status": {}
        });
        if let Some(privacy) = privacy {
            video["status"]["privacyStatus"] = json!(privacy);
        }
        video
    }

    #[test]
    fn test_video_item_maps_to_candidate() {
        let item: VideoItem = serde_json::from_value(video_json("abc", Some("unlisted"))).unwrap();
        let candidate = Candidate::from(item);

        assert_eq!(candidate.id, "abc");
        assert_eq!(candidate.channel_name, "FinTek");
        assert_eq!(candidate.duration_seconds, 933);
        assert_eq!(candidate.privacy_status, PrivacyStatus::Unlisted);
        assert_eq!(candidate.published_at.to_rfc3339(), "2026-10-14T15:30:00+00:00");
        assert_eq!(candidate.url(), "https://youtube.com/watch?v=abc");
    }

    #[test]
    fn test_missing_privacy_status_defaults_to_public() {
        let item: VideoItem = serde_json::from_value(video_json("abc", None)).unwrap();
        assert_eq!(item.status.privacy_status, PrivacyStatus::Public);

        let item: VideoItem =
            serde_json::from_value(video_json("abc", Some("members"))).unwrap();
        assert_eq!(
            item.status.privacy_status,
            PrivacyStatus::Other("members".into())
        );
    }

    #[test]
    fn test_candidates_follow_search_order() {
        let response: ListResponse<VideoItem> = serde_json::from_value(json!({
            "items": [video_json("b", None), video_json("a", None), video_json("c", None)]
        }))
        .unwrap();

        let order = ["a", "missing", "b", "c"].map(String::from);
        let candidates = candidates_in_search_order(&order, response.items);

        let ids = candidates.iter().map(|c| c.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_listing_has_no_items() {
        let response: ListResponse<ChannelItem> = serde_json::from_value(json!({
            "kind": "youtube#channelListResponse",
            "pageInfo": { "totalResults": 0 }
        }))
        .unwrap();
        assert!(response.items.is_empty());
    }

    #[test]
    fn test_only_full_channel_ids_skip_handle_lookup() {
        assert!(is_channel_id("UC_x5XG1OV2P6uZZ5FSM9Ttw"));
        assert!(!is_channel_id("UCBerkeley"));
        assert!(!is_channel_id("@UC_x5XG1OV2P6uZZ5FSM9Ttw"));
        assert!(!is_channel_id("UC_x5XG1OV2P6uZZ5FSM9Ttw1"));

        assert_eq!(handle_query("UCBerkeley"), "@UCBerkeley");
        assert_eq!(handle_query("@FinTek"), "@FinTek");
    }
}
