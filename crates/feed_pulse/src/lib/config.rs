//! Monitoring profiles: which channels to poll and how to prompt for their summaries.
//!
//! A profile is a TOML file. Everything except `name` and `channels` has a default.
//!
//! ```toml
//! name = "finance"
//! channels = ["@MeetKevin", "@GrahamStephan"]
//! videos_per_channel = 3
//! timezone = "America/New_York"
//! ```

use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use regex::{Captures, Regex};
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    types::Candidate,
};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("valid placeholder regex"));

static PROFILE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid profile name regex"));

pub const DEFAULT_SUMMARY_PROMPT: &str = "Summarize this video for a busy professional. Do not omit any actionable detail.

You MUST include:
1. Key Points: The main claims or findings, in order of importance.
2. Specifics: Every name, number, date or product that is mentioned.
3. The Stance: Is the creator recommending, warning against, or just describing?
4. The 'Why': The core argument in two or three sentences.
5. Actionability: What is the one thing I should do or watch after seeing this?

Video Title: {title}
Channel: {channel}
Published: {published}

Transcript:
{transcript}
";

pub const DEFAULT_DESCRIPTION_PROMPT: &str = "Summarize this video based only on its title and description.

Video Title: {title}
Channel: {channel}
Published: {published}

Description:
{description}

Based on this information, please provide:
1. Key Points: What the video appears to cover
2. Specifics: Any names, numbers or products mentioned
3. The Stance: What sentiment the title and description suggest
4. Actionability: Recommend watching the video at the URL below for full details

Note: This summary is based on limited information (title and description only) since the video transcript was not available.

VIDEO URL: {url}
";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    /// Scopes the processed-state file and digest file names
    pub name: String,
    /// Channel handles (`@name`) or channel ids, polled in this order
    pub channels: Vec<String>,
    #[serde(default = "default_videos_per_channel")]
    pub videos_per_channel: usize,
    /// Record videos without any transcript as processed instead of summarizing
    /// their description
    #[serde(default)]
    pub skip_no_transcript: bool,
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
    #[serde(default = "default_summary_prompt")]
    pub summary_prompt: String,
    #[serde(default = "default_description_prompt")]
    pub description_prompt: String,
}

fn default_videos_per_channel() -> usize {
    3
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("summaries")
}

fn default_timezone() -> Tz {
    Tz::UTC
}

fn default_summary_prompt() -> String {
    DEFAULT_SUMMARY_PROMPT.to_string()
}

fn default_description_prompt() -> String {
    DEFAULT_DESCRIPTION_PROMPT.to_string()
}

impl Profile {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let profile = toml::from_str::<Profile>(raw)
            .map_err(|e| Error::Config(format!("invalid profile: {e}")))?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read profile {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
            .inspect_err(|e| tracing::error!(error = %e, path = %path.display(), "Bad profile"))
    }

    fn validate(&self) -> Result<()> {
        if !PROFILE_NAME.is_match(&self.name) {
            return Err(Error::Config(format!(
                "profile name '{}' may only contain letters, digits, '-' and '_'",
                self.name
            )));
        }
        if self.channels.is_empty() || self.channels.iter().any(|c| c.trim().is_empty()) {
            return Err(Error::Config(
                "profile must list at least one non-empty channel".into(),
            ));
        }
        if !self.summary_prompt.contains("{transcript}") {
            return Err(Error::Config(
                "summary_prompt must contain a {transcript} placeholder".into(),
            ));
        }
        if !self.description_prompt.contains("{description}") {
            return Err(Error::Config(
                "description_prompt must contain a {description} placeholder".into(),
            ));
        }
        Ok(())
    }

    /// Publication time in the profile's timezone
    pub fn format_timestamp(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.timezone)
            .format("%Y-%m-%d %H:%M %Z")
            .to_string()
    }

    pub fn render_summary_prompt(&self, candidate: &Candidate, transcript: &str) -> String {
        let published = self.format_timestamp(candidate.published_at);
        render_template(&self.summary_prompt, |key| match key {
            "title" => Some(candidate.title.as_str()),
            "channel" => Some(candidate.channel_name.as_str()),
            "published" => Some(published.as_str()),
            "transcript" => Some(transcript),
            _ => None,
        })
    }

    pub fn render_description_prompt(&self, candidate: &Candidate) -> String {
        let published = self.format_timestamp(candidate.published_at);
        let url = candidate.url();
        render_template(&self.description_prompt, |key| match key {
            "title" => Some(candidate.title.as_str()),
            "channel" => Some(candidate.channel_name.as_str()),
            "published" => Some(published.as_str()),
            "description" => Some(candidate.description.as_str()),
            "url" => Some(url.as_str()),
            _ => None,
        })
    }
}

/// Substitutes `{key}` placeholders in one pass, so substituted text is never
/// re-scanned. Unknown placeholders are left as written.
pub fn render_template<'a, F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match lookup(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}
