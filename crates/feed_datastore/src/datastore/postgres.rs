use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use sqlx::{migrate::Migrator, postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};

use crate::{
    build_digest, datastore::DataStore, ChannelCount, DateRange, Digest, InsertOutcome,
    SearchQuery, StoreStats, StoredSummary, SummaryRecord, UnknownSourceType,
};

static MIGRATOR: Migrator = sqlx::migrate!();

const SUMMARY_COLUMNS: &str = "id, video_id, channel_name, video_title, video_url, \
    published_at, processed_at, source_type, summary_text, key_topics, recommendations, \
    action_items, duration_seconds";

/// Upper bound on rows pulled into a digest
const DIGEST_ROW_LIMIT: i64 = 100;

#[derive(Debug, Clone)]
pub struct PgDataStore {
    pub pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    id: i64,
    video_id: String,
    channel_name: String,
    video_title: String,
    video_url: String,
    published_at: DateTime<Utc>,
    processed_at: DateTime<Utc>,
    source_type: String,
    summary_text: String,
    key_topics: Option<String>,
    recommendations: Option<String>,
    action_items: Option<String>,
    duration_seconds: Option<i64>,
}

impl TryFrom<SummaryRow> for StoredSummary {
    type Error = UnknownSourceType;

    fn try_from(row: SummaryRow) -> Result<Self, Self::Error> {
        Ok(StoredSummary {
            id: row.id,
            processed_at: row.processed_at,
            record: SummaryRecord {
                video_id: row.video_id,
                channel_name: row.channel_name,
                title: row.video_title,
                url: row.video_url,
                published_at: row.published_at,
                duration_seconds: row.duration_seconds.unwrap_or_default(),
                source_type: row.source_type.parse()?,
                summary_text: row.summary_text,
                key_topics: row.key_topics,
                recommendations: row.recommendations,
                action_items: row.action_items,
            },
        })
    }
}

fn into_summaries(rows: Vec<SummaryRow>) -> anyhow::Result<Vec<StoredSummary>> {
    rows.into_iter()
        .map(|row| StoredSummary::try_from(row).map_err(anyhow::Error::from))
        .collect()
}

impl PgDataStore {
    /// Establish connection to database and run the embedded migrations
    pub async fn init(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .inspect_err(
                |e| tracing::error!(error = ?e, "Failed to establish connection to database"),
            )
            .context("Failed to connect to postgres database")?;

        MIGRATOR
            .run(&pool)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to run database migrations"))
            .context("Failed to run database migrations")?;

        Ok(PgDataStore { pool })
    }

    /// Pool that connects on first use; migrations are not run
    pub fn connect_lazy(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(database_url)
            .context("Invalid postgres connection string")?;

        Ok(PgDataStore { pool })
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_video_id(&self, video_id: &str) -> anyhow::Result<Option<StoredSummary>> {
        let row = sqlx::query_as::<_, SummaryRow>(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM videos WHERE video_id = $1"
        ))
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch video")?;

        row.map(StoredSummary::try_from)
            .transpose()
            .map_err(anyhow::Error::from)
    }

    /// Full-text search over title, summary and the structured fields, newest first
    #[tracing::instrument(skip(self))]
    pub async fn search(&self, query: &SearchQuery) -> anyhow::Result<Vec<StoredSummary>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {SUMMARY_COLUMNS} FROM videos WHERE TRUE"));

        if let Some(term) = &query.term {
            qb.push(" AND search_vector @@ websearch_to_tsquery('english', ")
                .push_bind(term.clone())
                .push(")");
        }
        if let Some(from) = query.from {
            qb.push(" AND published_at >= ").push_bind(from);
        }
        if let Some(channel) = &query.channel {
            qb.push(" AND channel_name ILIKE ")
                .push_bind(format!("%{channel}%"));
        }
        qb.push(" ORDER BY published_at DESC LIMIT ")
            .push_bind(query.limit);

        let rows = qb
            .build_query_as::<SummaryRow>()
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to search videos"))
            .context("Failed to search videos")?;

        into_summaries(rows)
    }

    /// Videos published within the last `days`, grouped by channel
    pub async fn digest(&self, days: u32) -> anyhow::Result<Digest> {
        let to = Utc::now();
        let from = to - Duration::days(i64::from(days));

        let summaries = self
            .search(&SearchQuery {
                from: Some(from),
                limit: DIGEST_ROW_LIMIT,
                ..Default::default()
            })
            .await?;

        Ok(build_digest(summaries, days, from, to))
    }

    pub async fn channels(&self) -> anyhow::Result<Vec<ChannelCount>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT channel_name, COUNT(*) AS video_count
            FROM videos
            GROUP BY channel_name
            ORDER BY video_count DESC, channel_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to count videos by channel")?;

        Ok(rows
            .into_iter()
            .map(|(name, video_count)| ChannelCount { name, video_count })
            .collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn stats(&self) -> anyhow::Result<StoreStats> {
        let total_videos = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM videos")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count videos")?;

        let by_source = sqlx::query_as::<_, (String, i64)>(
            "SELECT source_type, COUNT(*) FROM videos GROUP BY source_type",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to count videos by source type")?
        .into_iter()
        .collect();

        let (earliest, latest) = sqlx::query_as::<_, (Option<DateTime<Utc>>, Option<DateTime<Utc>>)>(
            "SELECT MIN(published_at), MAX(published_at) FROM videos",
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to fetch publish date range")?;

        let date_range = earliest
            .zip(latest)
            .map(|(earliest, latest)| DateRange { earliest, latest });

        Ok(StoreStats {
            total_videos,
            date_range,
            by_channel: self.channels().await?,
            by_source,
        })
    }
}

impl DataStore for PgDataStore {
    async fn insert_summary(&self, record: &SummaryRecord) -> anyhow::Result<InsertOutcome> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO videos (
                video_id, channel_name, video_title, video_url, published_at,
                source_type, summary_text, key_topics, recommendations, action_items,
                duration_seconds
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (video_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&record.video_id)
        .bind(&record.channel_name)
        .bind(&record.title)
        .bind(&record.url)
        .bind(record.published_at)
        .bind(record.source_type.as_str())
        .bind(&record.summary_text)
        .bind(&record.key_topics)
        .bind(&record.recommendations)
        .bind(&record.action_items)
        .bind(record.duration_seconds)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|err| {
            tracing::error!(
                error = ?err,
                video_id = %record.video_id,
                "Failed to insert summary"
            )
        })
        .context("Failed to insert summary")?;

        match id {
            Some(id) => Ok(InsertOutcome::Inserted(id)),
            None => {
                tracing::warn!(video_id = %record.video_id, "Video already in database, skipping");
                Ok(InsertOutcome::Duplicate)
            }
        }
    }
}
