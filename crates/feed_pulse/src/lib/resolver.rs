//! Turns a video id into a [`TranscriptOutcome`] by walking an ordered list of
//! acquisition stages until one yields text or detects an access restriction.

use std::{
    fmt,
    future::Future,
    path::{Path, PathBuf},
};

use crate::{
    types::{TranscriptMethod, TranscriptOutcome},
    yt::{AudioFetcher, CaptionSegment, CaptionSource, CaptionTrack},
    AudioInput, Transcriber,
};

/// Sent with every audio transcription request
pub const TRANSCRIPTION_INSTRUCTION: &str = "Please transcribe this audio completely and accurately.

Provide the full transcript of everything said in the audio. Do not summarize - transcribe word-for-word.
Return only the transcript text, nothing else.";

const TARGET_LANGUAGE: &str = "en";

const CAPTION_RESTRICTION_MARKERS: [&str; 4] =
    ["members only", "members-only", "join this channel", "premium"];

const DOWNLOAD_RESTRICTION_MARKERS: [&str; 4] =
    ["members only", "members-only", "private", "unavailable"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Captions,
    AudioTranscription,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Captions => f.write_str("captions"),
            Stage::AudioTranscription => f.write_str("audio_transcription"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StageResult {
    Found {
        content: String,
        method: TranscriptMethod,
    },
    /// Terminal: later stages are not attempted
    Restricted(String),
    Continue(String),
}

pub trait ResolveTranscript {
    fn resolve(&self, video_id: &str) -> impl Future<Output = TranscriptOutcome> + Send;
}

pub struct TranscriptResolver<C, A, T> {
    captions: C,
    audio: A,
    transcriber: T,
    scratch_dir: PathBuf,
    chunk_duration_seconds: Option<u16>,
    stages: Vec<Stage>,
}

impl<C, A, T> TranscriptResolver<C, A, T>
where
    C: CaptionSource + Sync,
    A: AudioFetcher + Sync,
    T: Transcriber + Sync,
{
    pub fn new(captions: C, audio: A, transcriber: T, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            captions,
            audio,
            transcriber,
            scratch_dir: scratch_dir.into(),
            chunk_duration_seconds: None,
            stages: vec![Stage::Captions, Stage::AudioTranscription],
        }
    }

    /// Transcribe downloaded audio in chunks of `chunk_duration_seconds`
    pub fn with_chunking(mut self, chunk_duration_seconds: u16) -> Self {
        self.chunk_duration_seconds = Some(chunk_duration_seconds);
        self
    }

    pub fn with_stages(mut self, stages: Vec<Stage>) -> Self {
        self.stages = stages;
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    async fn run_stage(&self, stage: Stage, video_id: &str) -> StageResult {
        match stage {
            Stage::Captions => self.captions_stage(video_id).await,
            Stage::AudioTranscription => self.audio_stage(video_id).await,
        }
    }

    async fn captions_stage(&self, video_id: &str) -> StageResult {
        let tracks = match self.captions.list_tracks(video_id).await {
            Ok(tracks) => tracks,
            Err(e) => {
                let message = format!("{e:#}");
                if has_marker(&message, &CAPTION_RESTRICTION_MARKERS) {
                    return StageResult::Restricted(message);
                }
                return StageResult::Continue(format!("caption listing failed: {message}"));
            }
        };

        if tracks.is_empty() {
            return StageResult::Continue("no caption tracks".into());
        }

        let manual = tracks
            .iter()
            .find(|t| !t.is_generated && t.is_language(TARGET_LANGUAGE));
        let generated = tracks
            .iter()
            .find(|t| t.is_generated && t.is_language(TARGET_LANGUAGE));

        for track in manual.into_iter().chain(generated) {
            if let Some(content) = self.fetch(track, None).await {
                return found_captions(content);
            }
        }

        for track in tracks
            .iter()
            .filter(|t| t.is_translatable && !t.is_language(TARGET_LANGUAGE))
        {
            if let Some(content) = self.fetch(track, Some(TARGET_LANGUAGE)).await {
                return found_captions(content);
            }
        }

        StageResult::Continue("no usable English caption track".into())
    }

    /// Fetches a track, optionally translated, and returns its joined text if any
    async fn fetch(&self, track: &CaptionTrack, translate_to: Option<&str>) -> Option<String> {
        let segments = match translate_to {
            Some(language_code) => self.captions.fetch_translated(track, language_code).await,
            None => self.captions.fetch_track(track).await,
        };

        match segments {
            Ok(segments) => join_segments(&segments),
            Err(e) => {
                tracing::debug!(
                    language = %track.language_code,
                    generated = track.is_generated,
                    error = %e,
                    "Caption track fetch failed"
                );
                None
            }
        }
    }

    async fn audio_stage(&self, video_id: &str) -> StageResult {
        let audio_path = match self.audio.download(video_id, &self.scratch_dir).await {
            Ok(path) => path,
            Err(e) => {
                let message = format!("{e:#}");
                if has_marker(&message, &DOWNLOAD_RESTRICTION_MARKERS) {
                    return StageResult::Restricted(message);
                }
                return StageResult::Continue(format!("audio download failed: {message}"));
            }
        };

        let chunks_dir_path = self
            .chunk_duration_seconds
            .map(|_| self.scratch_dir.join(format!("{video_id}_chunks")));
        let _scratch = ScratchAudio::new(audio_path.clone(), chunks_dir_path.clone());

        if !audio_path.exists() {
            return StageResult::Continue(format!(
                "downloaded audio missing at {}",
                audio_path.display()
            ));
        }

        let input = match (self.chunk_duration_seconds, chunks_dir_path) {
            (Some(chunk_duration_seconds), Some(chunks_dir_path)) => AudioInput::Chunked {
                chunk_duration_seconds,
                chunks_dir_path,
                file_path: audio_path,
            },
            _ => AudioInput::File(audio_path),
        };

        match self
            .transcriber
            .transcribe(input, TRANSCRIPTION_INSTRUCTION)
            .await
        {
            Ok(response) if !response.text.trim().is_empty() => StageResult::Found {
                content: response.text.trim().to_string(),
                method: TranscriptMethod::AudioTranscription,
            },
            Ok(_) => StageResult::Continue("transcription returned no text".into()),
            Err(e) => StageResult::Continue(format!("transcription failed: {e}")),
        }
    }
}

impl<C, A, T> ResolveTranscript for TranscriptResolver<C, A, T>
where
    C: CaptionSource + Sync,
    A: AudioFetcher + Sync,
    T: Transcriber + Sync,
{
    #[tracing::instrument(skip(self))]
    async fn resolve(&self, video_id: &str) -> TranscriptOutcome {
        let mut attempts = Vec::with_capacity(self.stages.len());

        for &stage in &self.stages {
            match self.run_stage(stage, video_id).await {
                StageResult::Found { content, method } => {
                    tracing::info!(%stage, chars = content.chars().count(), "Transcript found");
                    return TranscriptOutcome::Text { content, method };
                }
                StageResult::Restricted(reason) => {
                    tracing::info!(%stage, %reason, "Access restricted");
                    return TranscriptOutcome::RestrictedAccess { reason };
                }
                StageResult::Continue(reason) => {
                    tracing::debug!(%stage, %reason, "Stage yielded nothing");
                    attempts.push(format!("{stage}: {reason}"));
                }
            }
        }

        TranscriptOutcome::Unavailable { attempts }
    }
}

fn found_captions(content: String) -> StageResult {
    StageResult::Found {
        content,
        method: TranscriptMethod::Captions,
    }
}

fn has_marker(message: &str, markers: &[&str]) -> bool {
    let message = message.to_lowercase();
    markers.iter().any(|m| message.contains(m))
}

/// Space-joins segment texts in order; `None` when nothing but whitespace remains
pub fn join_segments(segments: &[CaptionSegment]) -> Option<String> {
    let text = segments
        .iter()
        .map(|s| s.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}

/// Removes downloaded audio, and any chunks cut from it, when dropped
struct ScratchAudio {
    file_path: PathBuf,
    chunks_dir_path: Option<PathBuf>,
}

impl ScratchAudio {
    fn new(file_path: PathBuf, chunks_dir_path: Option<PathBuf>) -> Self {
        Self {
            file_path,
            chunks_dir_path,
        }
    }
}

impl Drop for ScratchAudio {
    fn drop(&mut self) {
        remove_quietly(&self.file_path, |p| std::fs::remove_file(p));
        if let Some(dir) = &self.chunks_dir_path {
            remove_quietly(dir, |p| std::fs::remove_dir_all(p));
        }
    }
}

fn remove_quietly(path: &Path, remove: fn(&Path) -> std::io::Result<()>) {
    match remove(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed scratch audio"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove scratch audio"),
    }
}
