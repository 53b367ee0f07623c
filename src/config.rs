use crate::defaults;
use crate::level::LogLevel;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Tracker configuration
///
/// Holds every knob the tracker consults: the severity gate, the line
/// template, file mirroring, and the sampler period. Fields are mutated only
/// through the tracker's setters, which never validate, block, or fail.
///
/// Two fields have deferred effect by design:
/// - `log_file_path` takes effect on the next write;
/// - `monitoring_interval` is read when the sampler starts, so changing it
///   while the sampler runs only affects the next restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Whether emitted lines are also appended to `log_file_path`
    pub log_to_file: bool,
    /// Target file for mirrored lines
    pub log_file_path: PathBuf,
    /// Minimum severity emitted
    pub log_level: LogLevel,
    /// Line template with optional `{timestamp}`, `{level}`, `{message}`
    /// placeholders
    pub log_format: String,
    /// Sampler period, captured at sampler start
    pub monitoring_interval: Duration,
}

impl TrackerConfig {
    /// Create a configuration with the given file-mirroring settings and
    /// defaults for everything else.
    pub fn new(log_to_file: bool, log_file_path: impl Into<PathBuf>) -> Self {
        Self {
            log_to_file,
            log_file_path: log_file_path.into(),
            ..Self::default()
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            log_to_file: false,
            log_file_path: PathBuf::from(defaults::LOG_FILE_PATH),
            log_level: defaults::LOG_LEVEL,
            log_format: defaults::LOG_FORMAT.to_string(),
            monitoring_interval: defaults::MONITORING_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrackerConfig::default();

        assert!(!config.log_to_file);
        assert_eq!(config.log_file_path, PathBuf::from("app.log"));
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.log_format, "{timestamp} [{level}] {message}");
        assert_eq!(config.monitoring_interval, Duration::from_millis(5000));
    }

    #[test]
    fn test_new_overrides_file_settings_only() {
        let config = TrackerConfig::new(true, "/tmp/test.log");

        assert!(config.log_to_file);
        assert_eq!(config.log_file_path, PathBuf::from("/tmp/test.log"));
        assert_eq!(config.log_level, LogLevel::Info);
    }
}
