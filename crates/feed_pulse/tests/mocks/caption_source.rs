use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use feed_pulse::yt::{CaptionSegment, CaptionSource, CaptionTrack};

#[derive(Clone, Default)]
pub struct MockCaptionSource {
    tracks: HashMap<String, Vec<CaptionTrack>>,
    list_errors: HashMap<String, String>,
    /// locator -> text
    texts: HashMap<String, String>,
    /// locator -> English text
    translations: HashMap<String, String>,
    pub list_calls: Arc<Mutex<Vec<String>>>,
    /// `locator` or `locator->language`
    pub fetch_calls: Arc<Mutex<Vec<String>>>,
}

impl MockCaptionSource {
    /// Lists `track` for `video_id`; fetching it yields `text`, or fails when `None`
    pub fn with_track(mut self, video_id: &str, track: CaptionTrack, text: Option<&str>) -> Self {
        if let Some(text) = text {
            self.texts.insert(track.locator.clone(), text.to_string());
        }
        self.tracks.entry(video_id.to_string()).or_default().push(track);
        self
    }

    pub fn with_translation(mut self, track: &CaptionTrack, english: &str) -> Self {
        self.translations
            .insert(track.locator.clone(), english.to_string());
        self
    }

    pub fn with_list_error(mut self, video_id: &str, message: &str) -> Self {
        self.list_errors
            .insert(video_id.to_string(), message.to_string());
        self
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetch_calls.lock().unwrap().clone()
    }
}

fn segments(text: &str) -> Vec<CaptionSegment> {
    text.lines()
        .enumerate()
        .map(|(i, line)| CaptionSegment {
            start_ms: i as u64 * 1000,
            text: line.to_string(),
        })
        .collect()
}

impl CaptionSource for MockCaptionSource {
    async fn list_tracks(&self, video_id: &str) -> anyhow::Result<Vec<CaptionTrack>> {
        self.list_calls.lock().unwrap().push(video_id.to_string());
        if let Some(message) = self.list_errors.get(video_id) {
            anyhow::bail!("{message}");
        }
        Ok(self.tracks.get(video_id).cloned().unwrap_or_default())
    }

    async fn fetch_track(&self, track: &CaptionTrack) -> anyhow::Result<Vec<CaptionSegment>> {
        self.fetch_calls.lock().unwrap().push(track.locator.clone());
        match self.texts.get(&track.locator) {
            Some(text) => Ok(segments(text)),
            None => anyhow::bail!("HTTP Error 404: Not Found"),
        }
    }

    async fn fetch_translated(
        &self,
        track: &CaptionTrack,
        language_code: &str,
    ) -> anyhow::Result<Vec<CaptionSegment>> {
        self.fetch_calls
            .lock()
            .unwrap()
            .push(format!("{}->{language_code}", track.locator));
        match self.translations.get(&track.locator) {
            Some(text) => Ok(segments(text)),
            None => anyhow::bail!("translation not available"),
        }
    }
}
