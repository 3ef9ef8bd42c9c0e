//! Engine configuration.
//!
//! # Responsibility
//! - Hold the tunables of aggregation and refresh scheduling.
//! - Parse JSON configuration with every field optional.
//!
//! # Invariants
//! - A missing field falls back to its default; unknown fields are rejected.

use crate::group::aggregate::AggregationStrategy;
use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("refresh_timeout_ms must be greater than zero")]
    ZeroTimeout,
}

/// Tunables shared by the controllers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Fetch strategy for the notes list without search text.
    pub aggregation: AggregationStrategy,
    /// Upper bound for one recomputation; `None` waits indefinitely.
    pub refresh_timeout_ms: Option<u64>,
    /// Log level used by binaries that bootstrap logging.
    pub log_level: Option<String>,
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        if config.refresh_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn refresh_timeout(&self) -> Option<Duration> {
        self.refresh_timeout_ms.map(Duration::from_millis)
    }

    /// Configured log level, or the build-mode default.
    pub fn effective_log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, EngineConfig};
    use crate::group::aggregate::AggregationStrategy;
    use std::time::Duration;

    #[test]
    fn empty_object_yields_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.aggregation, AggregationStrategy::PerCategory);
        assert!(config.refresh_timeout().is_none());
    }

    #[test]
    fn fields_are_parsed() {
        let config = EngineConfig::from_json_str(
            r#"{"aggregation": "single_query", "refresh_timeout_ms": 250, "log_level": "warn"}"#,
        )
        .unwrap();
        assert_eq!(config.aggregation, AggregationStrategy::SingleQuery);
        assert_eq!(config.refresh_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.effective_log_level(), "warn");
    }

    #[test]
    fn unknown_fields_and_zero_timeout_are_rejected() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"aggregation": "single_query", "extra": 1}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"refresh_timeout_ms": 0}"#),
            Err(ConfigError::ZeroTimeout)
        ));
    }
}
