use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::database::ports::watch_records::MockWatchRecordsRepository;
use crate::providers::{MockTitleMetadataProvider, ProviderError};
use crate::resume::resolver::{self, resolve};
use crate::resume::service::ResumeService;
use vidra_model::{MediaKind, ResumePoint, SeasonInfo, WatchRecord};

const USER: Uuid = Uuid::nil();
const SERIES: u64 = 1399;

fn record(season: u16, episode: u16, progress: f32, secs_ago: i64) -> WatchRecord {
    WatchRecord {
        user_id: USER,
        title_id: SERIES,
        kind: MediaKind::Series,
        season,
        episode,
        progress,
        last_watched: Utc::now() - Duration::seconds(secs_ago),
    }
}

fn seasons(counts: &[(u16, u32)]) -> Vec<SeasonInfo> {
    counts
        .iter()
        .map(|&(season_number, episode_count)| SeasonInfo {
            season_number,
            episode_count,
        })
        .collect()
}

mod resolver_tests {
    use super::*;

    #[test]
    fn test_no_records_resolves_to_series_start() {
        assert_eq!(resolve(&[], None), ResumePoint::series_start());
        assert_eq!(
            resolve(&[], Some(&seasons(&[(1, 10)]))),
            ResumePoint::series_start()
        );
    }

    #[test]
    fn test_in_progress_record_returned_verbatim() {
        let records = vec![record(2, 3, 45.0, 60)];

        let point = resolve(&records, None);

        assert_eq!(point, ResumePoint { season: 2, episode: 3, progress: 45.0 });
    }

    #[test]
    fn test_in_progress_beats_further_completed_episodes() {
        // A rewatch of an early episode wins over the furthest point
        // reached: resume models the last pause.
        let records = vec![
            record(4, 5, 97.0, 30),
            record(2, 3, 45.0, 60),
            record(4, 4, 95.0, 3600),
        ];

        let point = resolve(&records, Some(&seasons(&[(1, 10), (2, 10), (3, 10), (4, 10)])));

        assert_eq!(point, ResumePoint { season: 2, episode: 3, progress: 45.0 });
    }

    #[test]
    fn test_most_recent_of_several_in_progress_wins() {
        let records = vec![
            record(1, 2, 50.0, 7200),
            record(3, 8, 20.0, 60),
            record(2, 5, 80.0, 3600),
        ];

        let point = resolve(&records, None);

        assert_eq!(point.season, 3);
        assert_eq!(point.episode, 8);
    }

    #[test]
    fn test_below_minimum_progress_counts_as_unwatched() {
        // A few accidental seconds of playback must not hijack resume.
        let records = vec![record(3, 1, 2.0, 10)];

        assert_eq!(resolve(&records, None), ResumePoint::series_start());
    }

    #[test]
    fn test_completed_mid_season_advances_to_next_episode() {
        let records = vec![record(1, 3, 96.0, 60)];

        let point = resolve(&records, Some(&seasons(&[(1, 10), (2, 10)])));

        assert_eq!(point, ResumePoint { season: 1, episode: 4, progress: 0.0 });
    }

    #[test]
    fn test_completed_season_finale_rolls_into_next_season() {
        let records = vec![record(1, 10, 98.0, 60)];

        let point = resolve(&records, Some(&seasons(&[(1, 10), (2, 8)])));

        assert_eq!(point, ResumePoint { season: 2, episode: 1, progress: 0.0 });
    }

    #[test]
    fn test_completed_series_finale_restarts_the_series() {
        let records = vec![record(2, 8, 100.0, 60)];

        let point = resolve(&records, Some(&seasons(&[(1, 10), (2, 8)])));

        assert_eq!(point, ResumePoint::series_start());
    }

    #[test]
    fn test_rollover_skips_seasons_with_no_episodes() {
        // An announced-but-empty next season is not further content.
        let records = vec![record(1, 10, 95.0, 60)];

        let point = resolve(&records, Some(&seasons(&[(1, 10), (2, 0)])));

        assert_eq!(point, ResumePoint::series_start());
    }

    #[test]
    fn test_furthest_completed_picked_by_season_then_episode() {
        let records = vec![
            record(1, 9, 99.0, 10),
            record(2, 2, 95.0, 7200),
            record(2, 1, 97.0, 3600),
        ];

        let point = resolve(&records, Some(&seasons(&[(1, 10), (2, 10)])));

        assert_eq!(point, ResumePoint { season: 2, episode: 3, progress: 0.0 });
    }

    #[test]
    fn test_missing_boundaries_returns_tentative_next_episode() {
        // Without season metadata the next episode is a best-effort guess.
        let records = vec![record(1, 10, 95.0, 60)];

        let point = resolve(&records, None);

        assert_eq!(point, ResumePoint { season: 1, episode: 11, progress: 0.0 });
    }

    #[test]
    fn test_gap_in_season_metadata_degrades_to_series_start() {
        // Records reference a season the metadata no longer lists.
        let records = vec![record(3, 2, 95.0, 60)];

        let point = resolve(&records, Some(&seasons(&[(1, 10), (2, 10)])));

        assert_eq!(point, ResumePoint::series_start());
    }

    #[test]
    fn test_walk_returns_sub_minimum_record_progress_verbatim() {
        // The next episode was started for a moment; keep that progress.
        let records = vec![record(1, 10, 95.0, 60), record(2, 1, 2.0, 30)];

        let point = resolve(&records, Some(&seasons(&[(1, 10), (2, 8)])));

        assert_eq!(point, ResumePoint { season: 2, episode: 1, progress: 2.0 });
    }

    #[test]
    fn test_threshold_classification_boundaries() {
        assert!(!resolver::is_in_progress(4.9));
        assert!(resolver::is_in_progress(5.0));
        assert!(resolver::is_in_progress(89.9));
        assert!(!resolver::is_in_progress(90.0));
        assert!(resolver::is_completed(90.0));
        assert!(!resolver::is_completed(89.9));
    }
}

mod orchestrator_tests {
    use super::*;

    fn service(
        watch: MockWatchRecordsRepository,
        metadata: MockTitleMetadataProvider,
    ) -> ResumeService {
        ResumeService::new(Arc::new(watch), Arc::new(metadata))
    }

    #[tokio::test]
    async fn test_no_records_skips_metadata_fetch() {
        let mut watch = MockWatchRecordsRepository::new();
        watch
            .expect_series_records()
            .times(1)
            .returning(|_, _| Ok(Vec::new()));

        let mut metadata = MockTitleMetadataProvider::new();
        metadata.expect_series_seasons().never();

        let point = service(watch, metadata)
            .resume_episode(USER, SERIES, "en-US")
            .await
            .unwrap();

        assert_eq!(point, ResumePoint::series_start());
    }

    #[tokio::test]
    async fn test_in_progress_record_skips_metadata_fetch() {
        let mut watch = MockWatchRecordsRepository::new();
        watch
            .expect_series_records()
            .times(1)
            .returning(|_, _| Ok(vec![record(2, 3, 45.0, 60)]));

        let mut metadata = MockTitleMetadataProvider::new();
        metadata.expect_series_seasons().never();

        let point = service(watch, metadata)
            .resume_episode(USER, SERIES, "en-US")
            .await
            .unwrap();

        assert_eq!(point, ResumePoint { season: 2, episode: 3, progress: 45.0 });
    }

    #[tokio::test]
    async fn test_completed_records_fetch_boundaries_and_drop_specials() {
        let mut watch = MockWatchRecordsRepository::new();
        watch
            .expect_series_records()
            .times(1)
            .returning(|_, _| Ok(vec![record(1, 10, 96.0, 60)]));

        let mut metadata = MockTitleMetadataProvider::new();
        metadata
            .expect_series_seasons()
            .times(1)
            .returning(|_, _| {
                Ok(seasons(&[(0, 14), (1, 10), (2, 8)]))
            });

        let point = service(watch, metadata)
            .resume_episode(USER, SERIES, "en-US")
            .await
            .unwrap();

        assert_eq!(point, ResumePoint { season: 2, episode: 1, progress: 0.0 });
    }

    #[tokio::test]
    async fn test_metadata_failure_degrades_to_boundary_less_resolution() {
        let mut watch = MockWatchRecordsRepository::new();
        watch
            .expect_series_records()
            .times(1)
            .returning(|_, _| Ok(vec![record(1, 10, 96.0, 60)]));

        let mut metadata = MockTitleMetadataProvider::new();
        metadata
            .expect_series_seasons()
            .times(1)
            .returning(|_, _| Err(ProviderError::ApiError("upstream 503".to_string())));

        let point = service(watch, metadata)
            .resume_episode(USER, SERIES, "en-US")
            .await
            .unwrap();

        // Tentative next episode, no boundary validation.
        assert_eq!(point, ResumePoint { season: 1, episode: 11, progress: 0.0 });
    }

    #[tokio::test]
    async fn test_continue_watching_mixes_movies_and_series() {
        let movie = WatchRecord {
            user_id: USER,
            title_id: 603,
            kind: MediaKind::Movie,
            season: 0,
            episode: 0,
            progress: 42.0,
            last_watched: Utc::now(),
        };
        let series_latest = record(2, 3, 45.0, 60);

        let mut watch = MockWatchRecordsRepository::new();
        let listing = vec![movie.clone(), series_latest.clone()];
        watch
            .expect_latest_per_title()
            .times(1)
            .returning(move |_, _| Ok(listing.clone()));
        watch
            .expect_series_records()
            .times(1)
            .returning(move |_, _| Ok(vec![series_latest.clone()]));

        let mut metadata = MockTitleMetadataProvider::new();
        metadata.expect_series_seasons().never();

        let entries = service(watch, metadata)
            .continue_watching(USER, "en-US", 20)
            .await
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title_id, 603);
        assert_eq!(entries[0].resume.progress, 42.0);
        assert_eq!(entries[1].title_id, SERIES);
        assert_eq!(
            entries[1].resume,
            ResumePoint { season: 2, episode: 3, progress: 45.0 }
        );
    }
}
