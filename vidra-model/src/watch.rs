use chrono::{DateTime, Utc};
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kind of title a watch record refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "series",
        }
    }

    /// Database column encoding (smallint)
    pub fn as_i16(&self) -> i16 {
        match self {
            MediaKind::Movie => 0,
            MediaKind::Series => 1,
        }
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            0 => Some(MediaKind::Movie),
            1 => Some(MediaKind::Series),
            _ => None,
        }
    }
}

impl std::str::FromStr for MediaKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaKind::Movie),
            "series" => Ok(MediaKind::Series),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of per-episode viewing state.
///
/// Season and episode are 0 for movies (a single pseudo-episode) and >= 1
/// for series. At most one record exists per
/// (user, title, kind, season, episode).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WatchRecord {
    pub user_id: Uuid,
    /// External (TMDB) title id
    pub title_id: u64,
    pub kind: MediaKind,
    pub season: u16,
    pub episode: u16,
    /// Viewing progress as a percentage, 0.0 to 100.0
    pub progress: f32,
    pub last_watched: DateTime<Utc>,
}

/// Season shape as reported by the title metadata source.
///
/// Not persisted; fetched on demand and cacheable upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SeasonInfo {
    pub season_number: u16,
    pub episode_count: u32,
}

/// The (season, episode, progress) tuple at which a user continues a series
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResumePoint {
    pub season: u16,
    pub episode: u16,
    /// Progress within the resumed episode, 0.0 to 100.0
    pub progress: f32,
}

impl ResumePoint {
    /// The fallback resume point: start of the series
    pub const fn series_start() -> Self {
        Self {
            season: 1,
            episode: 1,
            progress: 0.0,
        }
    }
}

/// Progress report sent by playback clients.
///
/// Reports are typically sent every 10-30 seconds during playback and
/// upsert the record identified by (title, kind, season, episode).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProgressUpdate {
    pub title_id: u64,
    pub kind: MediaKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub season: u16,
    #[cfg_attr(feature = "serde", serde(default))]
    pub episode: u16,
    /// Percentage, 0.0 to 100.0
    pub progress: f32,
}
