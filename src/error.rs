//! Unified error handling for the title-matcher library.
//!
//! Three layers of failure are kept apart:
//! - [`ResolveError`]: a single placeholder could not be resolved for an activity.
//!   Mostly expected and recoverable; the caller moves on to the next candidate.
//! - [`GenerateError`]: what [`crate::generate_title_and_description`] hands back
//!   when no title/description could be produced.
//! - [`ConfigError`]: the configuration file could not be loaded.

use thiserror::Error;

use crate::config::Metric;

/// Failure to resolve one placeholder against one activity.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    /// No category of the marker applies to the activity (and no else-category).
    #[error("no category of {metric}.{key} applies")]
    NoValue { metric: Metric, key: String },
    /// The placeholder names a marker key that is not configured.
    #[error("marker key '{key}' is not defined for {metric}")]
    UnknownKey { metric: Metric, key: String },
    /// The placeholder names no known metric or reserved token.
    #[error("unknown placeholder '{{{0}}}'")]
    UnknownPlaceholder(String),
    /// Heart rate zone text was requested but the activity has no usable HR stream.
    #[error("activity has no heart rate stream")]
    MissingHeartRate,
    /// Heart rate zone text was requested but no zone thresholds are configured.
    #[error("heart rate zones are not configured")]
    MissingHeartRateZones,
    /// Weather text was requested but the activity has no weather attached.
    #[error("activity has no weather data")]
    MissingWeather,
    /// A configured bound could not be parsed (HHMM time or YYYY-MM-DD specifier).
    #[error("malformed {what}: '{value}'")]
    Malformed { what: &'static str, value: String },
}

impl ResolveError {
    /// True for configuration defects that should abort the activity rather than
    /// fall back to the next candidate.
    pub fn is_defect(&self) -> bool {
        matches!(self, ResolveError::Malformed { .. })
    }

    pub(crate) fn malformed(what: &'static str, value: &str) -> Self {
        ResolveError::Malformed {
            what,
            value: value.to_string(),
        }
    }
}

/// Failure to generate a title and description for an activity.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerateError {
    /// No template or route template produced a renderable result.
    #[error("no applicable template for activity {activity_id}")]
    NoApplicableTemplate { activity_id: u64 },
    /// The configuration contains a bound the engine cannot interpret.
    #[error("malformed configuration while generating activity {activity_id}: {source}")]
    MalformedConfig {
        activity_id: u64,
        #[source]
        source: ResolveError,
    },
}

/// Failure to load the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid heart rate zones: {0}")]
    InvalidHeartRateZones(String),
}

/// Result type alias for generation.
pub type Result<T> = std::result::Result<T, GenerateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GenerateError::NoApplicableTemplate { activity_id: 42 };
        assert!(err.to_string().contains("42"));

        let err = ResolveError::UnknownKey {
            metric: Metric::Distance,
            key: "bad".to_string(),
        };
        assert_eq!(err.to_string(), "marker key 'bad' is not defined for distance");

        let err = ResolveError::UnknownPlaceholder("speed.fast".to_string());
        assert_eq!(err.to_string(), "unknown placeholder '{speed.fast}'");
    }

    #[test]
    fn test_only_malformed_is_defect() {
        assert!(ResolveError::malformed("HHMM time", "2561").is_defect());
        assert!(!ResolveError::MissingWeather.is_defect());
        assert!(!ResolveError::NoValue {
            metric: Metric::Pace,
            key: "k".to_string()
        }
        .is_defect());
    }

    #[test]
    fn test_malformed_config_keeps_source() {
        use std::error::Error;
        let err = GenerateError::MalformedConfig {
            activity_id: 7,
            source: ResolveError::malformed("date specifier", "2024-13"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("2024-13"));
    }
}
