//! Media catalog collaborators.
//!
//! The engine never owns the library of movies and series, nor the record of
//! past downloads. It reaches both through the traits below, plus the
//! `PriorityScorer` that ranks a parsed release against a quality profile.

mod scorer;
mod types;

pub use scorer::{PriorityScorer, RankTableScorer};
pub use types::*;

use chrono::{DateTime, Utc};

use crate::search::{EpisodeTarget, MediaKind, MovieTarget};

/// Read access to the wanted library, plus the two writes a search performs.
pub trait MediaCatalog: Send + Sync {
    /// Look up a movie by IMDB id.
    fn movie_by_external_id(&self, external_id: &str) -> Result<Option<MovieTarget>, CatalogError>;

    /// Look up a movie by title.
    ///
    /// With a year, a match must lie within `year_tolerance` years of it.
    fn movie_by_title(
        &self,
        title: &str,
        year: Option<u32>,
        year_tolerance: u32,
    ) -> Result<Option<MovieTarget>, CatalogError>;

    /// Look up an episode by TVDB series id and season/episode numbers.
    fn episode_by_external_id(
        &self,
        series_id: u32,
        season: u32,
        episode: u32,
    ) -> Result<Option<EpisodeTarget>, CatalogError>;

    /// Look up an episode by series title and identifier (`S01E02` or a date).
    fn episode_by_title(
        &self,
        series_title: &str,
        identifier: &str,
    ) -> Result<Option<EpisodeTarget>, CatalogError>;

    /// Add a movie that is not in the library yet.
    fn import_movie(&self, external_id: &str, quality_profile: &str)
        -> Result<MovieTarget, CatalogError>;

    /// Record that a target has just been searched.
    fn update_last_scan(
        &self,
        kind: MediaKind,
        catalog_id: u64,
        at: DateTime<Utc>,
    ) -> Result<(), CatalogError>;
}

/// Past downloads, used to reject duplicates.
pub trait DownloadHistory: Send + Sync {
    fn contains_url(&self, kind: MediaKind, url: &str) -> Result<bool, CatalogError>;

    /// Case-insensitive exact title lookup.
    fn contains_title(&self, kind: MediaKind, title: &str) -> Result<bool, CatalogError>;
}
