//! Pure resume-point resolution.
//!
//! Given every watch record a user holds for one series, plus (optionally)
//! the series' season shapes, compute the single episode to continue with.
//!
//! Resolution priority:
//!
//! 1. No records: start of the series.
//! 2. The most recently touched in-progress episode, verbatim. A user who
//!    rewatches an early episode mid-stream resumes there, not at their
//!    furthest point: "continue watching" models the last pause, not
//!    maximum progress.
//! 3. Otherwise the episode after the furthest completed one, walking
//!    forward over season boundaries when metadata is available.
//!
//! Inconsistent metadata (a season missing from the list, or the walk
//! exhausting its step bound) degrades to the start of the series rather
//! than failing: resume must never take the watch page down.

use std::collections::HashMap;

use tracing::warn;
use vidra_model::{ResumePoint, SeasonInfo, WatchRecord};

/// Below this percentage a record counts as unwatched, even though it
/// exists (a few seconds of accidental playback).
pub const MINIMUM_PROGRESS_THRESHOLD: f32 = 5.0;

/// At or above this percentage an episode counts as fully watched.
pub const COMPLETION_THRESHOLD: f32 = 90.0;

/// Bound on the forward walk, guarding against pathological metadata.
const MAX_FORWARD_STEPS: u32 = 200;

/// Whether a progress percentage counts as "in progress"
pub fn is_in_progress(progress: f32) -> bool {
    (MINIMUM_PROGRESS_THRESHOLD..COMPLETION_THRESHOLD).contains(&progress)
}

/// Whether a progress percentage counts as fully watched
pub fn is_completed(progress: f32) -> bool {
    progress >= COMPLETION_THRESHOLD
}

/// Resolve the resume point for one series.
///
/// `seasons` may be `None` when the caller skipped or failed the metadata
/// fetch; resolution then returns the tentative next episode without
/// boundary validation.
pub fn resolve(records: &[WatchRecord], seasons: Option<&[SeasonInfo]>) -> ResumePoint {
    if records.is_empty() {
        return ResumePoint::series_start();
    }

    // Most recent pause wins over furthest progress.
    if let Some(record) = records
        .iter()
        .filter(|r| is_in_progress(r.progress))
        .max_by_key(|r| r.last_watched)
    {
        return ResumePoint {
            season: record.season,
            episode: record.episode,
            progress: record.progress,
        };
    }

    let Some(furthest) = records
        .iter()
        .filter(|r| is_completed(r.progress))
        .max_by_key(|r| (r.season, r.episode))
    else {
        // Only sub-threshold records exist; nothing meaningful was watched.
        return ResumePoint::series_start();
    };

    let mut season = furthest.season;
    let mut episode = furthest.episode.saturating_add(1);

    let Some(seasons) = seasons else {
        // Best effort without boundaries: the episode after the furthest
        // completed one, which may not exist.
        return ResumePoint {
            season,
            episode,
            progress: 0.0,
        };
    };

    let episode_counts: HashMap<u16, u32> = seasons
        .iter()
        .map(|s| (s.season_number, s.episode_count))
        .collect();
    let progress_by_key: HashMap<(u16, u16), f32> = records
        .iter()
        .map(|r| ((r.season, r.episode), r.progress))
        .collect();

    for _ in 0..MAX_FORWARD_STEPS {
        let Some(&count) = episode_counts.get(&season) else {
            // The series structure is inconsistent with what was watched.
            warn!(season, "season missing from metadata during resume walk");
            return ResumePoint::series_start();
        };

        if u32::from(episode) > count {
            let next_season = season.saturating_add(1);
            match episode_counts.get(&next_season) {
                Some(&next_count) if next_count > 0 => {
                    season = next_season;
                    episode = 1;
                }
                // No further content: the series is fully watched.
                _ => return ResumePoint::series_start(),
            }
        }

        match progress_by_key.get(&(season, episode)) {
            Some(&progress) if is_completed(progress) => {
                episode = episode.saturating_add(1);
            }
            Some(&progress) => {
                return ResumePoint {
                    season,
                    episode,
                    progress,
                };
            }
            None => {
                return ResumePoint {
                    season,
                    episode,
                    progress: 0.0,
                };
            }
        }
    }

    warn!("resume walk exhausted its step bound; falling back to series start");
    ResumePoint::series_start()
}
