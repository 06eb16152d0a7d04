use std::{
    ops::Deref,
    path::{Path, PathBuf},
};

use crate::{
    types::YOUTUBE_VIDEO_BASE_URL,
    yt::{ytdlp::YtDlp, AudioFetcher},
};

const AUDIO_FORMAT: &str = "mp3";

#[derive(Debug, Clone)]
pub struct YtDlpAudio(pub YtDlp);

impl YtDlpAudio {
    pub fn new(yt_dlp: YtDlp) -> Self {
        Self(yt_dlp)
    }
}

impl Deref for YtDlpAudio {
    type Target = YtDlp;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AudioFetcher for YtDlpAudio {
    #[tracing::instrument(skip(self))]
    async fn download(&self, video_id: &str, dest_dir: &Path) -> anyhow::Result<PathBuf> {
        let video_url = format!("{YOUTUBE_VIDEO_BASE_URL}?v={video_id}");

        let audio_output_template = dest_dir.join(format!("{video_id}.%(ext)s"));
        let audio_path = dest_dir.join(format!("{video_id}.{AUDIO_FORMAT}"));

        tokio::fs::create_dir_all(dest_dir).await?;

        if audio_path.exists() {
            tracing::debug!("Audio already exists at {}", audio_path.display());
            return Ok(audio_path);
        }

        if let Err(e) = self
            .download_audio(&video_url, AUDIO_FORMAT, &audio_output_template)
            .await
        {
            tracing::error!(error = ?e, "Failed to download audio");
            remove_partial_downloads(dest_dir, video_id).await;
            anyhow::bail!("Failed to download audio: {e:#}");
        }

        if !audio_path.exists() {
            remove_partial_downloads(dest_dir, video_id).await;
            anyhow::bail!(
                "yt-dlp did not produce expected file: {}",
                audio_path.display()
            );
        }

        let size_mb = tokio::fs::metadata(&audio_path)
            .await
            .map(|m| m.len() as f64 / 1024.0 / 1024.0)
            .unwrap_or_default();
        tracing::info!(size_mb, "Audio downloaded");

        Ok(audio_path)
    }
}

/// Deletes whatever yt-dlp left behind for `video_id` (`.part`, `.webm`, ...)
async fn remove_partial_downloads(dest_dir: &Path, video_id: &str) {
    let prefix = format!("{video_id}.");
    let Ok(mut entries) = tokio::fs::read_dir(dest_dir).await else {
        return;
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(&prefix));
        if !matches {
            continue;
        }

        let path = entry.path();
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed partial download"),
            Err(e) => tracing::warn!(error = %e, path = %path.display(), "Failed to remove partial download"),
        }
    }
}
