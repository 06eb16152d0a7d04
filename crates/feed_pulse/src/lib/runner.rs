//! Wires the production collaborators into a [`SummaryPipeline`] and runs it once.

use std::path::PathBuf;

use anyhow::Context;
use feed_datastore::DataStore;
use tokio_util::sync::CancellationToken;

use crate::{
    config::Profile,
    digest::{email::EmailDigestSink, email::SmtpSettings, FileDigestSink},
    openai::OpenAIClient,
    pipeline::report::RunReport,
    resolver::TranscriptResolver,
    tracker::{JsonStateFile, ProcessedStateFile, ReadOnlyState},
    yt::{audio_handler::YtDlpAudio, captions::YtDlpCaptions, data_api::YouTubeDataApi, ytdlp::YtDlp},
    SummaryPipelineBuilder,
};

/// Fits a 25 MB transcription upload at typical podcast bitrates
pub const DEFAULT_CHUNK_DURATION_SECONDS: u16 = 900;

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub profile: Profile,
    pub youtube_api_key: String,
    pub openai_api_key: String,
    /// Holds one `<profile>.processed.json` per profile
    pub state_dir: PathBuf,
    /// Downloaded audio lives here only while it is being transcribed
    pub scratch_dir: PathBuf,
    /// Downloaded audio is always transcribed in chunks of this length
    pub chunk_duration_seconds: u16,
    pub cookies_path: Option<PathBuf>,
    /// Email the digest when set
    pub smtp: Option<SmtpSettings>,
    /// Read the processed state but never write it back
    pub dry_run: bool,
}

pub async fn run_once<D>(
    config: &RunConfig,
    store: D,
    cancellation_token: CancellationToken,
) -> anyhow::Result<RunReport>
where
    D: DataStore + Send + Sync,
{
    let state = JsonStateFile::for_profile(&config.state_dir, &config.profile.name);
    if config.dry_run {
        run_with_state(config, store, ReadOnlyState(state), cancellation_token).await
    } else {
        run_with_state(config, store, state, cancellation_token).await
    }
}

async fn run_with_state<D, P>(
    config: &RunConfig,
    store: D,
    processed_state: P,
    cancellation_token: CancellationToken,
) -> anyhow::Result<RunReport>
where
    D: DataStore + Send + Sync,
    P: ProcessedStateFile + Send + Sync,
{
    let profile = &config.profile;

    let yt_dlp = YtDlp::new_with_cookies(config.cookies_path.clone())
        .context("Failed to configure yt-dlp")?;
    let openai = OpenAIClient::new(&config.openai_api_key, yt_dlp.clone());

    let resolver = TranscriptResolver::new(
        YtDlpCaptions::new(yt_dlp.clone()),
        YtDlpAudio::new(yt_dlp),
        openai.clone(),
        config.scratch_dir.join(&profile.name),
    )
    .with_chunking(config.chunk_duration_seconds);

    let mut builder = SummaryPipelineBuilder::new(profile.clone())
        .feed_source(YouTubeDataApi::new(&config.youtube_api_key))
        .resolver(resolver)
        .summarizer(openai)
        .store(store)
        .processed_state(processed_state)
        .cancellation_token(cancellation_token)
        .digest_sink(FileDigestSink::new(&profile.output_directory));

    if let Some(smtp) = &config.smtp {
        builder = builder.digest_sink(
            EmailDigestSink::new(smtp.clone()).context("Failed to configure email digest")?,
        );
    }

    builder.build().run().await
}
