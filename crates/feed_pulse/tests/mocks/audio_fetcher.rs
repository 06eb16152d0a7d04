use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use feed_pulse::yt::AudioFetcher;

/// Writes a small placeholder file so cleanup can be observed
#[derive(Clone, Default)]
pub struct MockAudioFetcher {
    fail_with: Option<String>,
    skip_write: bool,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub paths: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockAudioFetcher {
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    /// Reports success without producing a file
    pub fn without_file() -> Self {
        Self {
            skip_write: true,
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn downloaded_paths(&self) -> Vec<PathBuf> {
        self.paths.lock().unwrap().clone()
    }
}

impl AudioFetcher for MockAudioFetcher {
    async fn download(&self, video_id: &str, dest_dir: &Path) -> anyhow::Result<PathBuf> {
        self.calls.lock().unwrap().push(video_id.to_string());
        if let Some(message) = &self.fail_with {
            anyhow::bail!("{message}");
        }

        let path = dest_dir.join(format!("{video_id}.mp3"));
        if !self.skip_write {
            tokio::fs::create_dir_all(dest_dir).await?;
            tokio::fs::write(&path, b"ID3 fake audio").await?;
        }
        self.paths.lock().unwrap().push(path.clone());
        Ok(path)
    }
}
