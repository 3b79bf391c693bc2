use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub indexers: Vec<IndexerConfig>,
    #[serde(default)]
    pub regex_profiles: Vec<RegexProfile>,
    #[serde(default)]
    pub paths: Vec<PathConfig>,
    #[serde(default)]
    pub quality_profiles: Vec<QualityProfile>,
}

impl Config {
    pub fn quality_profile(&self, name: &str) -> Option<&QualityProfile> {
        self.quality_profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn indexer(&self, name: &str) -> Option<&IndexerConfig> {
        self.indexers
            .iter()
            .find(|i| i.name.eq_ignore_ascii_case(name))
    }

    pub fn regex_profile(&self, name: &str) -> Option<&RegexProfile> {
        self.regex_profiles
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))
    }

    pub fn path(&self, name: &str) -> Option<&PathConfig> {
        self.paths.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

/// Search engine tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Concurrent indexer queries per search (0 is treated as 1).
    #[serde(default = "default_workers")]
    pub worker_indexer: usize,
    /// Concurrent target searches in a batch (0 is treated as 1).
    #[serde(default = "default_workers")]
    pub worker_search: usize,
    /// How long a failed indexer is skipped. 0 maps to the default.
    #[serde(default = "default_block_minutes")]
    pub failed_indexer_block_time_minutes: u64,
    /// Deadline for a single indexer query.
    #[serde(default = "default_indexer_timeout")]
    pub indexer_timeout_secs: u64,
}

impl SearchConfig {
    pub fn indexer_workers(&self) -> usize {
        self.worker_indexer.max(1)
    }

    pub fn search_workers(&self) -> usize {
        self.worker_search.max(1)
    }

    pub fn block_window(&self) -> chrono::Duration {
        let minutes = if self.failed_indexer_block_time_minutes == 0 {
            default_block_minutes()
        } else {
            self.failed_indexer_block_time_minutes
        };
        chrono::Duration::minutes(minutes.min(MAX_BLOCK_MINUTES) as i64)
    }

    pub fn indexer_timeout(&self) -> std::time::Duration {
        let secs = if self.indexer_timeout_secs == 0 {
            default_indexer_timeout()
        } else {
            self.indexer_timeout_secs
        };
        std::time::Duration::from_secs(secs)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            worker_indexer: default_workers(),
            worker_search: default_workers(),
            failed_indexer_block_time_minutes: default_block_minutes(),
            indexer_timeout_secs: default_indexer_timeout(),
        }
    }
}

fn default_workers() -> usize {
    1
}

/// Longest block window honoured: one year.
pub const MAX_BLOCK_MINUTES: u64 = 525_600;

fn default_block_minutes() -> u64 {
    5
}

fn default_indexer_timeout() -> u64 {
    30
}

/// An external release indexer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexerConfig {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Max requests per minute (0 = unlimited).
    #[serde(default)]
    pub rate_limit_rpm: u32,
    /// Reject results that report a size of 0 bytes.
    #[serde(default)]
    pub skip_empty_size: bool,
    /// Whether the indexer understands IMDB/TVDB id queries.
    #[serde(default = "default_true")]
    pub external_id_search: bool,
    #[serde(default = "default_movie_categories")]
    pub movie_categories: Vec<u32>,
    #[serde(default = "default_series_categories")]
    pub series_categories: Vec<u32>,
    /// Max results requested per query.
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl IndexerConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            rate_limit_rpm: 0,
            skip_empty_size: false,
            external_id_search: true,
            movie_categories: default_movie_categories(),
            series_categories: default_series_categories(),
            limit: default_limit(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_movie_categories() -> Vec<u32> {
    vec![2000]
}

fn default_series_categories() -> Vec<u32> {
    vec![5000]
}

fn default_limit() -> u32 {
    100
}

/// Required / rejected title patterns. Matching is case-insensitive.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RegexProfile {
    pub name: String,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub rejected: Vec<String>,
}

/// Size thresholds for a media path. 0 disables a bound.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PathConfig {
    pub name: String,
    #[serde(default)]
    pub min_size_mb: u64,
    #[serde(default)]
    pub max_size_mb: u64,
}

impl PathConfig {
    pub fn min_size_bytes(&self) -> u64 {
        self.min_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn max_size_bytes(&self) -> Option<u64> {
        (self.max_size_mb > 0).then(|| self.max_size_mb.saturating_mul(1024 * 1024))
    }
}

/// Wanted attributes and matching rules for a target.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QualityProfile {
    pub name: String,
    #[serde(default)]
    pub wanted_resolution: Vec<String>,
    #[serde(default)]
    pub wanted_quality: Vec<String>,
    #[serde(default)]
    pub wanted_codec: Vec<String>,
    #[serde(default)]
    pub wanted_audio: Vec<String>,
    #[serde(default)]
    pub check_title: bool,
    #[serde(default)]
    pub check_year: bool,
    /// Accept year-1 and year+1 too.
    #[serde(default)]
    pub check_year1: bool,
    #[serde(default)]
    pub check_until_first_found: bool,
    #[serde(default)]
    pub backup_search_for_title: bool,
    #[serde(default)]
    pub backup_search_for_alternate_title: bool,
    #[serde(default)]
    pub exclude_year_from_title_search: bool,
    #[serde(default)]
    pub history_check_title: bool,
    #[serde(default)]
    pub indexers: Vec<QualityIndexer>,
}

/// An indexer entry inside a quality profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QualityIndexer {
    /// Name of an `[[indexers]]` entry.
    pub indexer: String,
    /// Overrides the indexer's default categories when non-empty.
    #[serde(default)]
    pub categories: Vec<u32>,
    /// Name of a `[[regex_profiles]]` entry.
    #[serde(default)]
    pub regex: Option<String>,
    /// Name of a `[[paths]]` entry.
    #[serde(default)]
    pub path: Option<String>,
}

impl QualityIndexer {
    pub fn new(indexer: impl Into<String>) -> Self {
        Self {
            indexer: indexer.into(),
            ..Default::default()
        }
    }
}
