use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use vidra_core::{api::ApiResponse, resume::service::ContinueWatchingEntry};
use vidra_model::{MediaKind, ProgressUpdate, ResumePoint, User};

use crate::infra::{app_state::AppState, errors::AppError};

#[derive(Debug, Deserialize)]
pub struct ContinueWatchingQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Deserialize)]
pub struct ResumeQuery {
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_limit() -> i64 {
    20
}

fn default_language() -> String {
    "en-US".to_string()
}

/// Report playback progress for an episode or movie.
///
/// Upserts the record keyed by (title, kind, season, episode); repeated
/// reports for the same key only move progress and the last-watched
/// timestamp.
///
/// # Response
///
/// - `204 No Content` on success
/// - `400 Bad Request` if validation fails
pub async fn update_progress_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(update): Json<ProgressUpdate>,
) -> Result<StatusCode, AppError> {
    if !(0.0..=100.0).contains(&update.progress) {
        return Err(AppError::bad_request("Progress must be between 0 and 100"));
    }

    match update.kind {
        MediaKind::Movie if update.season != 0 || update.episode != 0 => {
            return Err(AppError::bad_request(
                "Movies use season 0 and episode 0",
            ));
        }
        MediaKind::Series if update.season == 0 || update.episode == 0 => {
            return Err(AppError::bad_request(
                "Series progress requires season and episode numbers",
            ));
        }
        _ => {}
    }

    state
        .unit_of_work
        .watch_records
        .upsert_progress(user.id, &update)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// The continue-watching rail: one resolved resume point per title,
/// most recently watched first
pub async fn continue_watching_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(params): Query<ContinueWatchingQuery>,
) -> Result<Json<ApiResponse<Vec<ContinueWatchingEntry>>>, AppError> {
    let entries = state
        .resume
        .continue_watching(user.id, &params.language, params.limit.clamp(1, 100))
        .await?;

    Ok(Json(ApiResponse::success(entries)))
}

/// Where the user resumes a series; drives the watch-page redirect
pub async fn resume_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(series_id): Path<u64>,
    Query(params): Query<ResumeQuery>,
) -> Result<Json<ApiResponse<ResumePoint>>, AppError> {
    let point = state
        .resume
        .resume_episode(user.id, series_id, &params.language)
        .await?;

    Ok(Json(ApiResponse::success(point)))
}

/// Remove every watch record for one title
pub async fn clear_title_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path((kind, title_id)): Path<(String, u64)>,
) -> Result<StatusCode, AppError> {
    let kind: MediaKind = kind
        .parse()
        .map_err(|_| AppError::bad_request("Unknown media kind"))?;

    state
        .unit_of_work
        .watch_records
        .clear_title(user.id, title_id, kind)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Remove the record for a single episode
pub async fn clear_episode_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path((kind, title_id, season, episode)): Path<(String, u64, u16, u16)>,
) -> Result<StatusCode, AppError> {
    let kind: MediaKind = kind
        .parse()
        .map_err(|_| AppError::bad_request("Unknown media kind"))?;

    state
        .unit_of_work
        .watch_records
        .clear_episode(user.id, title_id, kind, season, episode)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Remove the user's entire watch history
pub async fn clear_all_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<StatusCode, AppError> {
    state.unit_of_work.watch_records.clear_all(user.id).await?;

    Ok(StatusCode::NO_CONTENT)
}
