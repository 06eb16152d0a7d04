//! Thin process wrappers around the `yt-dlp` and `ffmpeg` executables.

use std::{
    future::Future,
    path::{Path, PathBuf},
    process::Output,
};

use anyhow::Context;
use tokio::process::Command;

/// Audio post-processing backed by ffmpeg
pub trait AudioProcessor {
    /// Splits `input` into consecutive chunks of `chunk_duration_seconds`, written
    /// using the ffmpeg segment `output_pattern` (e.g. `dir/name_%03d.mp3`)
    fn split_audio_to_chunks(
        &self,
        input: &Path,
        chunk_duration_seconds: u16,
        output_pattern: PathBuf,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

#[derive(Debug, Clone)]
pub struct YtDlp {
    yt_dlp_bin: PathBuf,
    ffmpeg_bin: PathBuf,
    cookies_path: Option<PathBuf>,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self {
            yt_dlp_bin: "yt-dlp".into(),
            ffmpeg_bin: "ffmpeg".into(),
            cookies_path: None,
        }
    }
}

impl YtDlp {
    pub fn new_with_cookies(cookies_path: Option<PathBuf>) -> anyhow::Result<Self> {
        if let Some(path) = &cookies_path {
            anyhow::ensure!(
                path.exists(),
                "yt-dlp cookies file not found: {}",
                path.display()
            );
        }

        Ok(Self {
            cookies_path,
            ..Default::default()
        })
    }

    fn yt_dlp_command(&self) -> Command {
        let mut cmd = Command::new(&self.yt_dlp_bin);
        cmd.args(["--no-warnings", "--no-playlist"]);
        if let Some(cookies) = &self.cookies_path {
            cmd.arg("--cookies").arg(cookies);
        }
        cmd.kill_on_drop(true);
        cmd
    }

    /// Runs a command to completion and fails with its stderr when it exits non-zero
    async fn run(mut cmd: Command, program: &str) -> anyhow::Result<Output> {
        let output = cmd
            .output()
            .await
            .with_context(|| format!("Failed to spawn {program}"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("{program} exited with {}: {}", output.status, stderr.trim());
        }

        Ok(output)
    }

    /// Video metadata as printed by `yt-dlp --dump-single-json`
    #[tracing::instrument(skip(self))]
    pub async fn dump_metadata(&self, url: &str) -> anyhow::Result<serde_json::Value> {
        let mut cmd = self.yt_dlp_command();
        cmd.args(["--dump-single-json", "--skip-download", url]);

        let output = Self::run(cmd, "yt-dlp").await?;
        serde_json::from_slice(&output.stdout).context("yt-dlp printed invalid JSON metadata")
    }

    /// Extracts the best audio stream of `url` into `output_template`
    /// (a yt-dlp template such as `dir/<id>.%(ext)s`)
    #[tracing::instrument(skip(self))]
    pub async fn download_audio(
        &self,
        url: &str,
        audio_format: &str,
        output_template: &Path,
    ) -> anyhow::Result<()> {
        let mut cmd = self.yt_dlp_command();
        cmd.args(["--quiet", "-f", "bestaudio/best", "-x", "--audio-format"])
            .arg(audio_format)
            .args(["--audio-quality", "192K", "-o"])
            .arg(output_template)
            .arg(url);

        Self::run(cmd, "yt-dlp").await?;
        Ok(())
    }
}

impl AudioProcessor for YtDlp {
    #[tracing::instrument(skip(self))]
    async fn split_audio_to_chunks(
        &self,
        input: &Path,
        chunk_duration_seconds: u16,
        output_pattern: PathBuf,
    ) -> anyhow::Result<()> {
        let mut cmd = Command::new(&self.ffmpeg_bin);
        cmd.args(["-hide_banner", "-loglevel", "error", "-y", "-i"])
            .arg(input)
            .args(["-f", "segment", "-segment_time"])
            .arg(chunk_duration_seconds.to_string())
            .args(["-c", "copy"])
            .arg(output_pattern)
            .kill_on_drop(true);

        Self::run(cmd, "ffmpeg").await?;
        Ok(())
    }
}
