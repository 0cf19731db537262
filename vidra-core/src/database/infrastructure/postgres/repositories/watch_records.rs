use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    database::ports::watch_records::WatchRecordsRepository,
    error::{CoreError, Result},
};
use vidra_model::{MediaKind, ProgressUpdate, WatchRecord};

#[derive(Clone, Debug)]
pub struct PostgresWatchRecordsRepository {
    pool: PgPool,
}

impl PostgresWatchRecordsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WatchRecordRow {
    user_id: Uuid,
    title_id: i64,
    kind: i16,
    season_number: i16,
    episode_number: i16,
    progress: f32,
    last_watched: DateTime<Utc>,
}

impl WatchRecordRow {
    fn into_model(self) -> Result<WatchRecord> {
        let kind = MediaKind::from_i16(self.kind).ok_or_else(|| {
            CoreError::Internal(format!("Unknown media kind in store: {}", self.kind))
        })?;
        Ok(WatchRecord {
            user_id: self.user_id,
            title_id: self.title_id as u64,
            kind,
            season: self.season_number as u16,
            episode: self.episode_number as u16,
            progress: self.progress,
            last_watched: self.last_watched,
        })
    }
}

#[async_trait]
impl WatchRecordsRepository for PostgresWatchRecordsRepository {
    async fn upsert_progress(
        &self,
        user_id: Uuid,
        update: &ProgressUpdate,
    ) -> Result<WatchRecord> {
        let now = Utc::now();

        let row = sqlx::query_as::<_, WatchRecordRow>(
            r#"
            INSERT INTO watch_records (
                user_id, title_id, kind, season_number, episode_number, progress, last_watched
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, title_id, kind, season_number, episode_number)
            DO UPDATE SET
                progress = EXCLUDED.progress,
                last_watched = EXCLUDED.last_watched
            RETURNING user_id, title_id, kind, season_number, episode_number, progress, last_watched
            "#,
        )
        .bind(user_id)
        .bind(update.title_id as i64)
        .bind(update.kind.as_i16())
        .bind(update.season as i16)
        .bind(update.episode as i16)
        .bind(update.progress.clamp(0.0, 100.0))
        .bind(now)
        .fetch_one(self.pool())
        .await?;

        row.into_model()
    }

    async fn series_records(
        &self,
        user_id: Uuid,
        series_id: u64,
    ) -> Result<Vec<WatchRecord>> {
        let rows = sqlx::query_as::<_, WatchRecordRow>(
            r#"
            SELECT user_id, title_id, kind, season_number, episode_number, progress, last_watched
            FROM watch_records
            WHERE user_id = $1 AND title_id = $2 AND kind = $3
            ORDER BY last_watched DESC
            "#,
        )
        .bind(user_id)
        .bind(series_id as i64)
        .bind(MediaKind::Series.as_i16())
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(WatchRecordRow::into_model).collect()
    }

    async fn latest_per_title(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<WatchRecord>> {
        // DISTINCT ON picks the newest record per (title, kind); the outer
        // query re-sorts the winners by recency for display.
        let rows = sqlx::query_as::<_, WatchRecordRow>(
            r#"
            SELECT user_id, title_id, kind, season_number, episode_number, progress, last_watched
            FROM (
                SELECT DISTINCT ON (title_id, kind)
                    user_id, title_id, kind, season_number, episode_number, progress, last_watched
                FROM watch_records
                WHERE user_id = $1
                ORDER BY title_id, kind, last_watched DESC
            ) latest
            ORDER BY last_watched DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(WatchRecordRow::into_model).collect()
    }

    async fn clear_title(
        &self,
        user_id: Uuid,
        title_id: u64,
        kind: MediaKind,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM watch_records
            WHERE user_id = $1 AND title_id = $2 AND kind = $3
            "#,
        )
        .bind(user_id)
        .bind(title_id as i64)
        .bind(kind.as_i16())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }

    async fn clear_episode(
        &self,
        user_id: Uuid,
        title_id: u64,
        kind: MediaKind,
        season: u16,
        episode: u16,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM watch_records
            WHERE user_id = $1 AND title_id = $2 AND kind = $3
              AND season_number = $4 AND episode_number = $5
            "#,
        )
        .bind(user_id)
        .bind(title_id as i64)
        .bind(kind.as_i16())
        .bind(season as i16)
        .bind(episode as i16)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }

    async fn clear_all(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM watch_records WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }
}
