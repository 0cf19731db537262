use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use vidra_model::{MediaKind, ProgressUpdate, WatchRecord};

/// Read/write access to per-episode watch state.
///
/// The store holds at most one record per
/// (user, title, kind, season, episode); writes go through the upsert.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WatchRecordsRepository: Send + Sync {
    /// Create or update the record identified by the update's full key
    async fn upsert_progress(
        &self,
        user_id: Uuid,
        update: &ProgressUpdate,
    ) -> Result<WatchRecord>;

    /// All of one user's records for a series, most recently watched first
    async fn series_records(
        &self,
        user_id: Uuid,
        series_id: u64,
    ) -> Result<Vec<WatchRecord>>;

    /// The most recent record per (title, kind), most recent title first
    async fn latest_per_title(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<WatchRecord>>;

    /// Delete every record for one title; returns rows removed
    async fn clear_title(
        &self,
        user_id: Uuid,
        title_id: u64,
        kind: MediaKind,
    ) -> Result<u64>;

    /// Delete a single episode record; returns rows removed
    async fn clear_episode(
        &self,
        user_id: Uuid,
        title_id: u64,
        kind: MediaKind,
        season: u16,
        episode: u16,
    ) -> Result<u64>;

    /// Delete the user's entire watch history; returns rows removed
    async fn clear_all(&self, user_id: Uuid) -> Result<u64>;
}
