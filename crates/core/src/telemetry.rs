//! Logging setup for binaries embedding the engine.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Install a global subscriber. `RUST_LOG` wins over `default_filter`.
///
/// Returns an error if a global subscriber is already set.
pub fn init_logging(
    default_filter: &str,
    format: LogFormat,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        // Other tests may have installed a subscriber already; either way
        // the second call in this test must fail.
        let _ = init_logging("info,scoutarr_core=debug", LogFormat::Text);
        assert!(init_logging("info", LogFormat::Json).is_err());
    }
}
