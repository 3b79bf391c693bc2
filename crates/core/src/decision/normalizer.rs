use std::collections::HashSet;

use tracing::trace;

use crate::indexer::RawRelease;

use super::Candidate;

/// Turns raw indexer hits into pending candidates.
///
/// One normalizer lives for one indexer task, so a release returned by
/// several strategies of that task is only kept the first time.
#[derive(Debug, Default)]
pub struct CandidateNormalizer {
    seen_urls: HashSet<String>,
}

impl CandidateNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalize(&mut self, raw: Vec<RawRelease>, strategy: &str) -> Vec<Candidate> {
        raw.into_iter()
            .filter(|release| {
                let url = release.download_url.trim();
                if url.is_empty() {
                    trace!(title = %release.title, "Dropping release without download URL");
                    return false;
                }
                self.seen_urls.insert(url.to_string())
            })
            .map(|release| Candidate::new(release, strategy))
            .collect()
    }

    pub fn seen(&self) -> usize {
        self.seen_urls.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_across_calls_are_dropped() {
        let mut normalizer = CandidateNormalizer::new();
        let first = normalizer.normalize(
            vec![
                RawRelease::new("A.2020.1080p", "http://x/a", 1, "geek"),
                RawRelease::new("A.2020.1080p", "http://x/a", 1, "geek"),
                RawRelease::new("B.2020.1080p", "http://x/b", 1, "geek"),
            ],
            "external_id",
        );
        assert_eq!(first.len(), 2);

        let second = normalizer.normalize(
            vec![
                RawRelease::new("B.2020.1080p", "http://x/b", 1, "geek"),
                RawRelease::new("C.2020.1080p", "http://x/c", 1, "geek"),
            ],
            "title",
        );
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].strategy, "title");
        assert_eq!(normalizer.seen(), 3);
    }

    #[test]
    fn test_release_without_url_is_dropped() {
        let mut normalizer = CandidateNormalizer::new();
        let out = normalizer.normalize(vec![RawRelease::new("A.2020", "  ", 1, "geek")], "feed");
        assert!(out.is_empty());
    }
}
