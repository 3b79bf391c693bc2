use super::{
    types::{Config, MAX_BLOCK_MINUTES},
    ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - quality profile indexer entries reference known indexers, regex and path profiles
/// - regex patterns compile
/// - path size bounds are ordered
/// - the indexer block window is at most a year
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.search.failed_indexer_block_time_minutes > MAX_BLOCK_MINUTES {
        return Err(ConfigError::ValidationError(format!(
            "failed_indexer_block_time_minutes cannot exceed {}",
            MAX_BLOCK_MINUTES
        )));
    }

    for profile in &config.quality_profiles {
        if profile.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "quality profile name cannot be empty".to_string(),
            ));
        }
        for entry in &profile.indexers {
            if config.indexer(&entry.indexer).is_none() {
                return Err(ConfigError::ValidationError(format!(
                    "quality profile '{}' references unknown indexer '{}'",
                    profile.name, entry.indexer
                )));
            }
            if let Some(regex) = &entry.regex {
                if config.regex_profile(regex).is_none() {
                    return Err(ConfigError::ValidationError(format!(
                        "quality profile '{}' references unknown regex profile '{}'",
                        profile.name, regex
                    )));
                }
            }
            if let Some(path) = &entry.path {
                if config.path(path).is_none() {
                    return Err(ConfigError::ValidationError(format!(
                        "quality profile '{}' references unknown path '{}'",
                        profile.name, path
                    )));
                }
            }
        }
    }

    for regex_profile in &config.regex_profiles {
        for pattern in regex_profile
            .required
            .iter()
            .chain(regex_profile.rejected.iter())
        {
            if let Err(e) = regex_lite::Regex::new(pattern) {
                return Err(ConfigError::ValidationError(format!(
                    "regex profile '{}' has invalid pattern '{}': {}",
                    regex_profile.name, pattern, e
                )));
            }
        }
    }

    for path in &config.paths {
        if path.max_size_mb > 0 && path.min_size_mb > path.max_size_mb {
            return Err(ConfigError::ValidationError(format!(
                "path '{}' has min_size_mb greater than max_size_mb",
                path.name
            )));
        }
    }

    Ok(())
}
