use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use chrono::{Duration, Utc};
use clap::{Args, Parser, Subcommand};
use feed_datastore::{MemoryDataStore, PgDataStore, SearchQuery};
use feed_pulse::{
    api::{self, AppState, IngestController},
    config::Profile,
    digest::email::SmtpSettings,
    runner::{run_once, RunConfig, DEFAULT_CHUNK_DURATION_SECONDS},
    tracing::init_tracing_subscriber,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "feed-pulse", about = "YouTube channel monitor and summary search")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check every channel of the profile once and exit
    Run {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Database connection URL
        #[arg(long, env = "DATABASE_URL")]
        database_url: Option<String>,

        /// Keep summaries in memory, skip email and leave processed state untouched
        #[arg(long)]
        dry_run: bool,
    },
    /// Serve the query API with a background ingest trigger
    Serve {
        #[command(flatten)]
        pipeline: PipelineArgs,

        #[command(flatten)]
        db: DbArgs,

        #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0:8000")]
        bind: String,
    },
    /// Full-text search over stored summaries
    Search {
        query: String,

        /// Only videos published in the last N days
        #[arg(long)]
        days: Option<u32>,

        /// Case-insensitive channel name filter
        #[arg(long)]
        channel: Option<String>,

        #[arg(long, default_value_t = 10)]
        limit: i64,

        #[command(flatten)]
        db: DbArgs,
    },
    /// Videos from the last N days grouped by channel
    Digest {
        #[arg(long, default_value_t = 7)]
        days: u32,

        #[command(flatten)]
        db: DbArgs,
    },
    /// Totals by channel and by source type
    Stats {
        #[command(flatten)]
        db: DbArgs,
    },
    /// Show one stored summary
    Video {
        video_id: String,

        #[command(flatten)]
        db: DbArgs,
    },
    /// Channels with their stored video counts
    Channels {
        #[command(flatten)]
        db: DbArgs,
    },
}

#[derive(Args)]
struct DbArgs {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

impl DbArgs {
    async fn connect(&self) -> anyhow::Result<PgDataStore> {
        PgDataStore::init(&self.database_url).await
    }
}

#[derive(Args, Clone)]
struct PipelineArgs {
    /// Profile TOML file
    #[arg(long, env = "FEED_PULSE_PROFILE")]
    profile: PathBuf,

    /// YouTube Data API key
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    youtube_api_key: String,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_key: String,

    /// Path to yt-dlp cookies file
    #[arg(long, env = "YTDLP_COOKIES_PATH")]
    cookies_path: Option<PathBuf>,

    /// Transcribe downloaded audio in chunks of this many seconds
    #[arg(
        long,
        env = "CHUNK_DURATION_SECONDS",
        default_value_t = DEFAULT_CHUNK_DURATION_SECONDS,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    chunk_duration: u16,

    /// Directory holding the per-profile processed state
    #[arg(long, env = "FEED_PULSE_STATE_DIR", default_value = ".feed-pulse")]
    state_dir: PathBuf,

    /// Working directory for downloaded audio
    #[arg(long, default_value = "/var/tmp/feed-pulse")]
    workdir: PathBuf,

    #[command(flatten)]
    smtp: SmtpArgs,
}

#[derive(Args, Clone)]
struct SmtpArgs {
    #[arg(long, env = "SMTP_HOST", default_value = "smtp.gmail.com")]
    smtp_host: String,

    #[arg(long, env = "SMTP_USER")]
    smtp_user: Option<String>,

    #[arg(long, env = "SMTP_PASS", hide_env_values = true)]
    smtp_pass: Option<String>,

    /// Defaults to the SMTP user
    #[arg(long, env = "RECIPIENT_EMAIL")]
    recipient: Option<String>,
}

impl SmtpArgs {
    fn settings(&self) -> Option<SmtpSettings> {
        let (Some(user), Some(pass)) = (&self.smtp_user, &self.smtp_pass) else {
            return None;
        };
        Some(SmtpSettings {
            host: self.smtp_host.clone(),
            username: user.clone(),
            password: pass.clone(),
            from: user.clone(),
            to: self.recipient.clone(),
        })
    }
}

impl PipelineArgs {
    fn run_config(&self, dry_run: bool) -> anyhow::Result<RunConfig> {
        let profile = Profile::load(&self.profile)?;
        let smtp = if dry_run {
            None
        } else {
            self.smtp.settings()
        };
        if !dry_run && smtp.is_none() {
            tracing::warn!("SMTP credentials not set, digest will only be saved to file");
        }

        Ok(RunConfig {
            profile,
            youtube_api_key: self.youtube_api_key.clone(),
            openai_api_key: self.openai_key.clone(),
            state_dir: self.state_dir.clone(),
            scratch_dir: self.workdir.clone(),
            chunk_duration_seconds: self.chunk_duration,
            cookies_path: self.cookies_path.clone(),
            smtp,
            dry_run,
        })
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Cancels the token on the first Ctrl-C so the run stops after the current video
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping after the current video");
            ctrl_c_token.cancel();
        }
    });
    token
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some("production".into()),
            ..Default::default()
        },
    ));

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    match cli.command {
        Command::Run {
            pipeline,
            database_url,
            dry_run,
        } => {
            let config = pipeline.run_config(dry_run)?;
            let token = cancel_on_ctrl_c();

            let report = if dry_run {
                let store = MemoryDataStore::new();
                let report = run_once(&config, store.clone(), token).await?;
                print_json(&store.records())?;
                report
            } else {
                let database_url =
                    database_url.context("DATABASE_URL is required unless --dry-run is set")?;
                let store = PgDataStore::init(&database_url).await?;
                run_once(&config, store, token).await?
            };

            println!("{report}");
        }
        Command::Serve { pipeline, db, bind } => {
            let config = pipeline.run_config(false)?;
            let store = db.connect().await?;

            let run_store = store.clone();
            let ingest = IngestController::new(move || {
                let config = config.clone();
                let store = run_store.clone();
                async move {
                    run_once(&config, store, CancellationToken::new())
                        .await
                        .map(|report| report.to_string())
                }
            });

            let state = AppState {
                store,
                ingest: Arc::new(ingest),
            };
            api::serve(&bind, state).await?;
        }
        Command::Search {
            query,
            days,
            channel,
            limit,
            db,
        } => {
            let store = db.connect().await?;
            let results = store
                .search(&SearchQuery {
                    term: Some(query),
                    from: days.map(|d| Utc::now() - Duration::days(i64::from(d))),
                    channel,
                    limit,
                })
                .await?;
            print_json(&results)?;
        }
        Command::Digest { days, db } => {
            let store = db.connect().await?;
            print_json(&store.digest(days).await?)?;
        }
        Command::Stats { db } => {
            let store = db.connect().await?;
            print_json(&store.stats().await?)?;
        }
        Command::Video { video_id, db } => {
            let store = db.connect().await?;
            match store.get_by_video_id(&video_id).await? {
                Some(summary) => print_json(&summary)?,
                None => anyhow::bail!("Video {video_id} not found"),
            }
        }
        Command::Channels { db } => {
            let store = db.connect().await?;
            print_json(&store.channels().await?)?;
        }
    }

    Ok(())
}
