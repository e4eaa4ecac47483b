//! Application configuration file support.
//!
//! Configuration is read from a TOML file once at startup and then handed to
//! the components that need it. Every section has defaults, so a partial (or
//! absent) file is valid.
//!
//! ```toml
//! [analysis]
//! ignore_online_classes = true
//! ignore_gym_classes = true
//! ignore_different_buildings = true
//! max_gap_hours = 3.0
//! max_range_of_lessons_per_day = 2
//!
//! [app]
//! host = "0.0.0.0"
//! port = 8080
//! do_checksum_check = true
//! job_timeout_secs = 300
//!
//! [fetch]
//! schedule_url = "https://schedule-of.mirea.ru/schedule/api/ical/{0}/{1}"
//! search_url = "https://schedule-of.mirea.ru/schedule/api/search"
//!
//! [repository]
//! type = "local"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::db::factory::RepositoryType;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "BOTTLENECK_CONFIG";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub app: ServerSettings,
    #[serde(default)]
    pub fetch: FetchSettings,
    #[serde(default)]
    pub repository: RepositorySettings,
}

/// Thresholds used by the bottleneck classifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Online lessons never produce distant-classroom or large-gap findings.
    #[serde(default = "default_true")]
    pub ignore_online_classes: bool,
    /// Physical education lessons never produce distant-classroom findings.
    #[serde(default = "default_true")]
    pub ignore_gym_classes: bool,
    /// When set, different buildings on the same campus are also checked
    /// (with a much shorter tolerated break than different campuses).
    #[serde(default = "default_true")]
    pub ignore_different_buildings: bool,
    /// Minimum idle time, in hours, reported as a large gap.
    #[serde(default = "default_max_gap_hours")]
    pub max_gap_hours: f64,
    /// Largest tolerated difference between the busiest and the quietest
    /// non-empty weekday of a week.
    #[serde(default = "default_max_range_of_lessons_per_day")]
    pub max_range_of_lessons_per_day: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            ignore_online_classes: true,
            ignore_gym_classes: true,
            ignore_different_buildings: true,
            max_gap_hours: default_max_gap_hours(),
            max_range_of_lessons_per_day: default_max_range_of_lessons_per_day(),
        }
    }
}

/// Server and job processing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Reuse stored results when the fetched calendar is unchanged.
    #[serde(default = "default_true")]
    pub do_checksum_check: bool,
    /// Upper bound for a single job body. Unset means no limit.
    #[serde(default)]
    pub job_timeout_secs: Option<u64>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            do_checksum_check: true,
            job_timeout_secs: None,
        }
    }
}

impl ServerSettings {
    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout_secs.map(Duration::from_secs)
    }
}

/// Remote schedule API endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchSettings {
    /// Calendar URL template: `{0}` is the target kind code, `{1}` the remote id.
    #[serde(default = "default_schedule_url")]
    pub schedule_url: String,
    #[serde(default = "default_search_url")]
    pub search_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            schedule_url: default_schedule_url(),
            search_url: default_search_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Repository type settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type", default = "default_repository_type")]
    pub repo_type: String,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            repo_type: default_repository_type(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_gap_hours() -> f64 {
    3.0
}

fn default_max_range_of_lessons_per_day() -> u32 {
    2
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_schedule_url() -> String {
    "https://schedule-of.mirea.ru/schedule/api/ical/{0}/{1}".to_string()
}

fn default_search_url() -> String {
    "https://schedule-of.mirea.ru/schedule/api/search".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_repository_type() -> String {
    "local".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: AppConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `BOTTLENECK_CONFIG` or the default locations.
    ///
    /// Searches for `bottleneck.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    ///
    /// Falls back to defaults when no file is found.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Self::from_file(path);
        }

        let search_paths = [
            PathBuf::from("bottleneck.toml"),
            PathBuf::from("backend/bottleneck.toml"),
            PathBuf::from("../bottleneck.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                log::info!("Loading configuration from {}", path.display());
                return Self::from_file(&path);
            }
        }

        log::warn!("No bottleneck.toml found, using default configuration");
        Ok(Self::default())
    }

    /// Reject values the analysis cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.analysis.max_gap_hours.is_finite() || self.analysis.max_gap_hours < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "analysis.max_gap_hours must be a non-negative number, got {}",
                self.analysis.max_gap_hours
            )));
        }
        if !self.fetch.schedule_url.contains("{1}") {
            return Err(ConfigError::Invalid(
                "fetch.schedule_url must contain the {1} remote id placeholder".to_string(),
            ));
        }
        self.repository_type()?;
        Ok(())
    }

    /// Get the repository type from configuration.
    pub fn repository_type(&self) -> Result<RepositoryType, ConfigError> {
        RepositoryType::from_str(&self.repository.repo_type).map_err(ConfigError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.app.do_checksum_check);
        assert_eq!(config.app.job_timeout(), None);
        assert_eq!(config.repository_type().unwrap(), RepositoryType::Local);
    }

    #[test]
    fn test_parse_analysis_section() {
        let toml = r#"
[analysis]
ignore_online_classes = false
max_gap_hours = 4.5
max_range_of_lessons_per_day = 1
"#;

        let config: AppConfig = toml::from_str(toml).unwrap();
        assert!(!config.analysis.ignore_online_classes);
        assert!(config.analysis.ignore_gym_classes);
        assert_eq!(config.analysis.max_gap_hours, 4.5);
        assert_eq!(config.analysis.max_range_of_lessons_per_day, 1);
    }

    #[test]
    fn test_job_timeout_conversion() {
        let toml = r#"
[app]
port = 9000
job_timeout_secs = 15
"#;

        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.app.port, 9000);
        assert_eq!(config.app.job_timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_validate_rejects_negative_gap() {
        let mut config = AppConfig::default();
        config.analysis.max_gap_hours = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_unknown_repository() {
        let mut config = AppConfig::default();
        config.repository.repo_type = "mongo".to_string();
        assert!(config.validate().is_err());
    }
}
