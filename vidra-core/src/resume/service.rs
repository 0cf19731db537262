use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    database::ports::watch_records::WatchRecordsRepository,
    error::Result,
    providers::TitleMetadataProvider,
    resume::resolver,
};
use vidra_model::{MediaKind, ResumePoint, SeasonInfo};

/// One row of the continue-watching rail
#[derive(Debug, Clone, Serialize)]
pub struct ContinueWatchingEntry {
    pub title_id: u64,
    pub kind: MediaKind,
    pub resume: ResumePoint,
    pub last_watched: DateTime<Utc>,
}

/// Orchestrates resume resolution: watch records first, season metadata
/// only when the resolver can actually use it.
pub struct ResumeService {
    watch_records: Arc<dyn WatchRecordsRepository>,
    metadata: Arc<dyn TitleMetadataProvider>,
}

impl fmt::Debug for ResumeService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResumeService").finish_non_exhaustive()
    }
}

impl ResumeService {
    pub fn new(
        watch_records: Arc<dyn WatchRecordsRepository>,
        metadata: Arc<dyn TitleMetadataProvider>,
    ) -> Self {
        Self {
            watch_records,
            metadata,
        }
    }

    /// Resolve where the user continues a series.
    ///
    /// Season boundaries only matter once resolution has to advance past a
    /// completed episode, so the metadata round trip is skipped when there
    /// are no records or any record is still in progress. A failed fetch
    /// degrades to boundary-less resolution; the watch page never breaks
    /// because the metadata service is down.
    pub async fn resume_episode(
        &self,
        user_id: Uuid,
        series_id: u64,
        language: &str,
    ) -> Result<ResumePoint> {
        let records = self.watch_records.series_records(user_id, series_id).await?;

        let needs_seasons = !records.is_empty()
            && !records.iter().any(|r| resolver::is_in_progress(r.progress));

        let seasons = if needs_seasons {
            self.fetch_seasons(series_id, language).await
        } else {
            None
        };

        Ok(resolver::resolve(&records, seasons.as_deref()))
    }

    async fn fetch_seasons(&self, series_id: u64, language: &str) -> Option<Vec<SeasonInfo>> {
        match self.metadata.series_seasons(series_id, language).await {
            Ok(seasons) => Some(
                seasons
                    .into_iter()
                    // Season 0 holds specials; they never participate in
                    // resume ordering.
                    .filter(|s| s.season_number > 0)
                    .collect(),
            ),
            Err(err) => {
                warn!(
                    series_id,
                    error = %err,
                    "season metadata unavailable; resolving without boundaries"
                );
                None
            }
        }
    }

    /// The continue-watching rail: the freshest record per title, movies
    /// resolved from their own record and series through the resolver.
    pub async fn continue_watching(
        &self,
        user_id: Uuid,
        language: &str,
        limit: i64,
    ) -> Result<Vec<ContinueWatchingEntry>> {
        let latest = self.watch_records.latest_per_title(user_id, limit).await?;

        let mut entries = Vec::with_capacity(latest.len());
        for record in latest {
            let resume = match record.kind {
                MediaKind::Movie => ResumePoint {
                    season: 0,
                    episode: 0,
                    progress: record.progress,
                },
                MediaKind::Series => {
                    self.resume_episode(user_id, record.title_id, language).await?
                }
            };

            entries.push(ContinueWatchingEntry {
                title_id: record.title_id,
                kind: record.kind,
                resume,
                last_watched: record.last_watched,
            });
        }

        Ok(entries)
    }
}
