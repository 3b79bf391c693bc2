//! Mock media catalog for testing.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

use crate::catalog::{CatalogError, MediaCatalog};
use crate::decision::matching::{external_ids_match, normalize_date, slugify};
use crate::search::{EpisodeTarget, MediaKind, MovieTarget};

/// A recorded last-scan update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedScan {
    pub kind: MediaKind,
    pub catalog_id: u64,
    pub at: DateTime<Utc>,
}

/// In-memory library with switchable write failures.
#[derive(Debug)]
pub struct MockMediaCatalog {
    movies: RwLock<Vec<MovieTarget>>,
    episodes: RwLock<Vec<EpisodeTarget>>,
    importable: RwLock<Vec<MovieTarget>>,
    imported: RwLock<Vec<String>>,
    scans: RwLock<Vec<RecordedScan>>,
    fail_scan_updates: AtomicBool,
    next_id: AtomicU64,
}

impl Default for MockMediaCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn titles_match(wanted: &str, title: &str, alternates: &[String]) -> bool {
    let wanted = slugify(wanted);
    !wanted.is_empty()
        && std::iter::once(title)
            .chain(alternates.iter().map(String::as_str))
            .any(|t| slugify(t) == wanted)
}

fn identifiers_match(a: &str, b: &str) -> bool {
    match (normalize_date(a), normalize_date(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a.eq_ignore_ascii_case(b),
    }
}

fn lock_error<T>(e: std::sync::PoisonError<T>) -> CatalogError {
    CatalogError::Database(e.to_string())
}

impl MockMediaCatalog {
    pub fn new() -> Self {
        Self {
            movies: RwLock::new(Vec::new()),
            episodes: RwLock::new(Vec::new()),
            importable: RwLock::new(Vec::new()),
            imported: RwLock::new(Vec::new()),
            scans: RwLock::new(Vec::new()),
            fail_scan_updates: AtomicBool::new(false),
            next_id: AtomicU64::new(1000),
        }
    }

    pub fn add_movie(&self, movie: MovieTarget) {
        self.movies.write().unwrap().push(movie);
    }

    pub fn add_episode(&self, episode: EpisodeTarget) {
        self.episodes.write().unwrap().push(episode);
    }

    /// Metadata `import_movie` returns for a known external id. Unknown ids
    /// are imported with the id as title.
    pub fn add_importable(&self, movie: MovieTarget) {
        self.importable.write().unwrap().push(movie);
    }

    /// External ids imported so far.
    pub fn imported(&self) -> Vec<String> {
        self.imported.read().unwrap().clone()
    }

    pub fn scans(&self) -> Vec<RecordedScan> {
        self.scans.read().unwrap().clone()
    }

    /// Make `update_last_scan` fail.
    pub fn fail_scan_updates(&self, fail: bool) {
        self.fail_scan_updates.store(fail, Ordering::SeqCst);
    }
}

impl MediaCatalog for MockMediaCatalog {
    fn movie_by_external_id(&self, external_id: &str) -> Result<Option<MovieTarget>, CatalogError> {
        let movies = self.movies.read().map_err(lock_error)?;
        Ok(movies
            .iter()
            .find(|m| {
                m.external_id
                    .as_deref()
                    .is_some_and(|id| external_ids_match(id, external_id))
            })
            .cloned())
    }

    fn movie_by_title(
        &self,
        title: &str,
        year: Option<u32>,
        year_tolerance: u32,
    ) -> Result<Option<MovieTarget>, CatalogError> {
        let movies = self.movies.read().map_err(lock_error)?;
        Ok(movies
            .iter()
            .find(|m| {
                let year_ok = match (year, m.year) {
                    (Some(found), Some(wanted)) => found.abs_diff(wanted) <= year_tolerance,
                    _ => true,
                };
                year_ok && titles_match(title, &m.wanted_title, &m.wanted_alternates)
            })
            .cloned())
    }

    fn episode_by_external_id(
        &self,
        series_id: u32,
        season: u32,
        episode: u32,
    ) -> Result<Option<EpisodeTarget>, CatalogError> {
        let episodes = self.episodes.read().map_err(lock_error)?;
        Ok(episodes
            .iter()
            .find(|e| {
                e.external_series_id == Some(series_id) && e.season == season && e.episode == episode
            })
            .cloned())
    }

    fn episode_by_title(
        &self,
        series_title: &str,
        identifier: &str,
    ) -> Result<Option<EpisodeTarget>, CatalogError> {
        let episodes = self.episodes.read().map_err(lock_error)?;
        Ok(episodes
            .iter()
            .find(|e| {
                identifiers_match(&e.identifier, identifier)
                    && titles_match(series_title, &e.wanted_title, &e.wanted_alternates)
            })
            .cloned())
    }

    fn import_movie(
        &self,
        external_id: &str,
        quality_profile: &str,
    ) -> Result<MovieTarget, CatalogError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let known = self
            .importable
            .read()
            .map_err(lock_error)?
            .iter()
            .find(|m| {
                m.external_id
                    .as_deref()
                    .is_some_and(|known| external_ids_match(known, external_id))
            })
            .cloned();
        let mut movie = known.unwrap_or_else(|| {
            MovieTarget::new(id, external_id, quality_profile).with_external_id(external_id)
        });
        movie.catalog_id = id;
        movie.quality_profile = quality_profile.to_string();
        self.movies.write().map_err(lock_error)?.push(movie.clone());
        self.imported
            .write()
            .map_err(lock_error)?
            .push(external_id.to_string());
        Ok(movie)
    }

    fn update_last_scan(
        &self,
        kind: MediaKind,
        catalog_id: u64,
        at: DateTime<Utc>,
    ) -> Result<(), CatalogError> {
        if self.fail_scan_updates.load(Ordering::SeqCst) {
            return Err(CatalogError::Database("scan update failed".to_string()));
        }
        self.scans.write().map_err(lock_error)?.push(RecordedScan {
            kind,
            catalog_id,
            at,
        });
        Ok(())
    }
}
