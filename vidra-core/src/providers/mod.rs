//! Title metadata source integration.
//!
//! The watch surface only needs one thing from the metadata service: the
//! season shapes of a series. The provider is a trait so resume logic can
//! be tested without the network, and every failure mode is an error the
//! orchestrator degrades on rather than propagates.

mod tmdb;

use async_trait::async_trait;
use vidra_model::SeasonInfo;

pub use tmdb::TmdbSeasonProvider;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Not found")]
    NotFound,

    #[error("Rate limited")]
    RateLimited,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Read-only season metadata for a series, at a given content language
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TitleMetadataProvider: Send + Sync {
    async fn series_seasons(
        &self,
        series_id: u64,
        language: &str,
    ) -> Result<Vec<SeasonInfo>, ProviderError>;
}
