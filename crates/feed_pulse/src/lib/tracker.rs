//! Durable, profile-scoped ledger of videos the pipeline has already routed.
//!
//! Membership means "attempted", not "succeeded": restricted and degraded items are
//! recorded too and are never revisited by later runs of the same profile.

use std::{
    collections::HashSet,
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use itertools::Itertools;

use crate::error::{Error, Result};

/// Full-set durable storage for processed video ids
pub trait ProcessedStateFile {
    /// Loads every stored id. Storage that does not exist yet is an empty set.
    fn load(&self) -> impl Future<Output = Result<HashSet<String>>> + Send;

    /// Replaces the stored set with `ids`
    fn store(&self, ids: &HashSet<String>) -> impl Future<Output = Result<()>> + Send;
}

impl<P: ProcessedStateFile + Sync> ProcessedStateFile for &P {
    fn load(&self) -> impl Future<Output = Result<HashSet<String>>> + Send {
        (**self).load()
    }

    fn store(&self, ids: &HashSet<String>) -> impl Future<Output = Result<()>> + Send {
        (**self).store(ids)
    }
}

/// JSON array of ids kept at `<state_dir>/<profile>.processed.json`
#[derive(Debug, Clone)]
pub struct JsonStateFile {
    path: PathBuf,
}

impl JsonStateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_profile(state_dir: impl AsRef<Path>, profile: &str) -> Self {
        Self::new(state_dir.as_ref().join(format!("{profile}.processed.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProcessedStateFile for JsonStateFile {
    async fn load(&self) -> Result<HashSet<String>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No processed state yet, starting empty");
                return Ok(HashSet::new());
            }
            Err(e) => return Err(e.into()),
        };

        let ids = serde_json::from_slice::<Vec<String>>(&bytes).map_err(|source| Error::State {
            path: self.path.clone(),
            source,
        })?;

        Ok(ids.into_iter().collect())
    }

    #[tracing::instrument(skip_all, fields(path = %self.path.display(), count = ids.len()))]
    async fn store(&self, ids: &HashSet<String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let sorted = ids.iter().sorted().collect::<Vec<_>>();
        let json = serde_json::to_vec_pretty(&sorted)?;

        // write-then-rename so readers never observe a partial file
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        Ok(())
    }
}

/// Loads through the wrapped state but never writes back. Dry runs skip what a
/// real run already handled without recording anything new.
#[derive(Debug, Clone)]
pub struct ReadOnlyState<P>(pub P);

impl<P: ProcessedStateFile + Sync> ProcessedStateFile for ReadOnlyState<P> {
    fn load(&self) -> impl Future<Output = Result<HashSet<String>>> + Send {
        self.0.load()
    }

    async fn store(&self, ids: &HashSet<String>) -> Result<()> {
        tracing::debug!(count = ids.len(), "Read-only processed state, not persisting");
        Ok(())
    }
}

#[derive(Debug)]
pub struct ProcessedSetTracker<P> {
    state: P,
    ids: HashSet<String>,
}

impl<P: ProcessedStateFile> ProcessedSetTracker<P> {
    pub async fn load(state: P) -> Result<Self> {
        let ids = state.load().await?;
        tracing::debug!(count = ids.len(), "Loaded processed set");
        Ok(Self { state, ids })
    }

    pub fn contains(&self, video_id: &str) -> bool {
        self.ids.contains(video_id)
    }

    /// In-memory only; nothing is durable until [`flush`](Self::flush)
    pub fn mark_processed(&mut self, video_id: impl Into<String>) -> bool {
        self.ids.insert(video_id.into())
    }

    pub async fn flush(&self) -> Result<()> {
        self.state.store(&self.ids).await
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
