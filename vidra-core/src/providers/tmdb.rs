use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use vidra_model::SeasonInfo;

use super::{ProviderError, TitleMetadataProvider};

const TMDB_API_BASE: &str = "https://api.themoviedb.org/3";

/// Season metadata backed by the TMDB REST API.
///
/// The client carries a request timeout so a stalled metadata service can
/// never stall the watch page; callers treat every error as "resolve
/// without boundaries".
pub struct TmdbSeasonProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for TmdbSeasonProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TmdbSeasonProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct SeriesDetailsBody {
    #[serde(default)]
    seasons: Vec<SeasonBody>,
}

#[derive(Debug, Deserialize)]
struct SeasonBody {
    season_number: i32,
    #[serde(default)]
    episode_count: u32,
}

fn seasons_from_body(body: SeriesDetailsBody) -> Vec<SeasonInfo> {
    body.seasons
        .into_iter()
        .filter(|s| s.season_number >= 0 && s.season_number <= i32::from(u16::MAX))
        .map(|s| SeasonInfo {
            season_number: s.season_number as u16,
            episode_count: s.episode_count,
        })
        .collect()
}

impl TmdbSeasonProvider {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: TMDB_API_BASE.to_string(),
        })
    }

    /// Point the provider at a different endpoint (test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl TitleMetadataProvider for TmdbSeasonProvider {
    async fn series_seasons(
        &self,
        series_id: u64,
        language: &str,
    ) -> Result<Vec<SeasonInfo>, ProviderError> {
        let url = format!("{}/tv/{}", self.base_url, series_id);
        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", language)])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(ProviderError::InvalidApiKey);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            return Err(ProviderError::ApiError(format!(
                "unexpected status {} from metadata service",
                status
            )));
        }

        let body: SeriesDetailsBody = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(seasons_from_body(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seasons_parse_from_details_payload() {
        let body: SeriesDetailsBody = serde_json::from_value(serde_json::json!({
            "id": 1399,
            "name": "Some Series",
            "seasons": [
                { "season_number": 0, "episode_count": 14 },
                { "season_number": 1, "episode_count": 10 },
                { "season_number": 2, "episode_count": 10 }
            ]
        }))
        .unwrap();

        let seasons = seasons_from_body(body);

        assert_eq!(
            seasons,
            vec![
                SeasonInfo { season_number: 0, episode_count: 14 },
                SeasonInfo { season_number: 1, episode_count: 10 },
                SeasonInfo { season_number: 2, episode_count: 10 },
            ]
        );
    }

    #[test]
    fn test_seasons_tolerate_missing_episode_count() {
        let body: SeriesDetailsBody = serde_json::from_value(serde_json::json!({
            "seasons": [
                { "season_number": 1 },
                { "season_number": 2, "episode_count": 8 }
            ]
        }))
        .unwrap();

        let seasons = seasons_from_body(body);

        assert_eq!(seasons[0].episode_count, 0);
        assert_eq!(seasons[1].episode_count, 8);
    }

    #[test]
    fn test_payload_without_seasons_parses_empty() {
        let body: SeriesDetailsBody =
            serde_json::from_value(serde_json::json!({ "id": 42 })).unwrap();

        assert!(seasons_from_body(body).is_empty());
    }
}
