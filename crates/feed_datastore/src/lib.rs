//! # DataStore Module
//!
//! Persistence for video summaries produced by the feed pipeline.
//!
//! The module uses sqlx for Postgres operations and exposes a small trait the pipeline
//! writes through, plus read-side queries (full-text search, stats, channel grouping)
//! used by the query service and CLI.

mod datastore;
mod domain;

pub use datastore::memory::MemoryDataStore;
pub use datastore::postgres::PgDataStore;
pub use datastore::{DataStore, InsertOutcome};
pub use domain::{
    build_digest, ChannelCount, ChannelDigest, DateRange, Digest, SearchQuery, SourceType,
    StoreStats, StoredSummary, SummaryRecord, UnknownSourceType,
};
