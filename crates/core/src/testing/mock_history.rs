//! Mock download history for testing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::catalog::{CatalogError, DownloadHistory};
use crate::decision::Candidate;
use crate::search::MediaKind;

#[derive(Debug, Clone)]
struct Entry {
    kind: MediaKind,
    url: String,
    title: String,
}

/// In-memory download history.
#[derive(Debug, Default)]
pub struct MockDownloadHistory {
    entries: RwLock<Vec<Entry>>,
    fail_lookups: AtomicBool,
}

impl MockDownloadHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, kind: MediaKind, url: &str, title: &str) {
        self.entries.write().unwrap().push(Entry {
            kind,
            url: url.to_string(),
            title: title.to_string(),
        });
    }

    /// Record accepted candidates as downloaded, the way a download step would.
    pub fn record_candidates<'a>(
        &self,
        kind: MediaKind,
        candidates: impl IntoIterator<Item = &'a Candidate>,
    ) {
        for candidate in candidates {
            self.record(kind, candidate.download_url(), &candidate.title);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every lookup fail.
    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    fn any(&self, pred: impl Fn(&Entry) -> bool) -> Result<bool, CatalogError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(CatalogError::Database("history unavailable".to_string()));
        }
        let entries = self
            .entries
            .read()
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        Ok(entries.iter().any(pred))
    }
}

impl DownloadHistory for MockDownloadHistory {
    fn contains_url(&self, kind: MediaKind, url: &str) -> Result<bool, CatalogError> {
        self.any(|e| e.kind == kind && e.url == url)
    }

    fn contains_title(&self, kind: MediaKind, title: &str) -> Result<bool, CatalogError> {
        self.any(|e| e.kind == kind && e.title.eq_ignore_ascii_case(title))
    }
}
