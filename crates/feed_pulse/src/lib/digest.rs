//! Plain-text report of the summaries produced by one run, and the sinks it is
//! delivered to.

pub mod email;

use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use feed_datastore::SummaryRecord;

const RULE_WIDTH: usize = 60;

#[derive(Debug, Clone)]
pub struct RunDigest {
    pub profile: String,
    pub timezone: Tz,
    pub generated_at: DateTime<Utc>,
    pub summaries: Vec<SummaryRecord>,
}

impl RunDigest {
    pub fn new(profile: impl Into<String>, timezone: Tz, summaries: Vec<SummaryRecord>) -> Self {
        Self {
            profile: profile.into(),
            timezone,
            generated_at: Utc::now(),
            summaries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    pub fn subject(&self) -> String {
        format!(
            "📊 {} Video Summary - {} New Video(s)",
            self.profile,
            self.summaries.len()
        )
    }

    /// `<profile>_summary_<local timestamp>.txt`
    pub fn file_name(&self) -> String {
        let stamp = self
            .generated_at
            .with_timezone(&self.timezone)
            .format("%Y-%m-%d_%H-%M-%S");
        format!("{}_summary_{stamp}.txt", self.profile)
    }

    pub fn render(&self) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let local = |at: DateTime<Utc>| {
            at.with_timezone(&self.timezone)
                .format("%Y-%m-%d %H:%M:%S %Z")
                .to_string()
        };

        let mut out = format!(
            "{} Video Summary\nGenerated: {}\n\nFound {} new video(s):\n",
            self.profile,
            local(self.generated_at),
            self.summaries.len()
        );

        for record in &self.summaries {
            out.push_str(&format!(
                "\n{rule}\n📺 {}\n{rule}\nChannel: {}\nPublished: {}\nDuration: {}s\nURL: {}\n\n{}\n",
                record.title,
                record.channel_name,
                local(record.published_at),
                record.duration_seconds,
                record.url,
                record.summary_text.trim_end(),
            ));
        }

        out.push_str("\n---\nThis is an automated report from feed-pulse.\n");
        out
    }
}

/// A destination for the run digest
#[async_trait]
pub trait DigestSink: Send + Sync {
    fn name(&self) -> &str;

    /// Delivers the digest and returns where it went
    async fn emit(&self, digest: &RunDigest) -> anyhow::Result<String>;
}

/// Writes each digest to its own file in `output_directory`
#[derive(Debug, Clone)]
pub struct FileDigestSink {
    output_directory: PathBuf,
}

impl FileDigestSink {
    pub fn new(output_directory: impl Into<PathBuf>) -> Self {
        Self {
            output_directory: output_directory.into(),
        }
    }
}

#[async_trait]
impl DigestSink for FileDigestSink {
    fn name(&self) -> &str {
        "file"
    }

    async fn emit(&self, digest: &RunDigest) -> anyhow::Result<String> {
        tokio::fs::create_dir_all(&self.output_directory)
            .await
            .with_context(|| format!("creating {}", self.output_directory.display()))?;

        let path = self.output_directory.join(digest.file_name());
        tokio::fs::write(&path, digest.render())
            .await
            .with_context(|| format!("writing {}", path.display()))?;

        tracing::info!(path = %path.display(), "Digest saved");
        Ok(path.display().to_string())
    }
}
