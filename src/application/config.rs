use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::entities::StreamAlertType;
use crate::domain::value_objects::SourceId;

/// Top-level application configuration loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub cameras: CameraConfig,
    #[serde(default)]
    pub alerts: AlertConfig,
}

/// Where the counting backend lives and how long a request may take.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Recorder endpoints (`/stream/*`). Falls back to `base_url`.
    #[serde(default)]
    pub stream_base_url: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Per-source polling cadence in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_latest_ms")]
    pub latest_ms: u64,
    #[serde(default = "default_status_ms")]
    pub reliability_ms: u64,
    #[serde(default = "default_status_ms")]
    pub stream_health_ms: u64,
    #[serde(default = "default_status_ms")]
    pub algorithm_health_ms: u64,
    #[serde(default = "default_status_ms")]
    pub counting_config_ms: u64,
    #[serde(default = "default_status_ms")]
    pub system_status_ms: u64,
    #[serde(default = "default_alerts_ms")]
    pub alerts_ms: u64,
    /// Cadence of an on-demand source while something observes it.
    #[serde(default = "default_on_demand_ms")]
    pub on_demand_ms: u64,
}

/// Deployment shape used until the backend reports its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_camera_count")]
    pub count: usize,
    #[serde(default = "default_expected_services")]
    pub expected_services: usize,
}

/// Alert list defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    #[serde(default = "default_alert_limit")]
    pub limit: u32,
    #[serde(default)]
    pub unacknowledged_only: bool,
    #[serde(default)]
    pub stream_alert_type: Option<StreamAlertType>,
}

// --- Defaults ---

const MIN_INTERVAL_MS: u64 = 100;

fn default_base_url() -> String {
    "http://localhost:5000/api".into()
}

const fn default_timeout() -> u64 {
    10
}

const fn default_latest_ms() -> u64 {
    1000
}

const fn default_status_ms() -> u64 {
    5000
}

const fn default_alerts_ms() -> u64 {
    10_000
}

const fn default_on_demand_ms() -> u64 {
    30_000
}

const fn default_camera_count() -> usize {
    19
}

const fn default_expected_services() -> usize {
    3
}

const fn default_alert_limit() -> u32 {
    100
}

// --- Default impls ---

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            stream_base_url: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            latest_ms: default_latest_ms(),
            reliability_ms: default_status_ms(),
            stream_health_ms: default_status_ms(),
            algorithm_health_ms: default_status_ms(),
            counting_config_ms: default_status_ms(),
            system_status_ms: default_status_ms(),
            alerts_ms: default_alerts_ms(),
            on_demand_ms: default_on_demand_ms(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            count: default_camera_count(),
            expected_services: default_expected_services(),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            limit: default_alert_limit(),
            unacknowledged_only: false,
            stream_alert_type: None,
        }
    }
}

impl BackendConfig {
    #[must_use]
    pub fn stream_url(&self) -> &str {
        self.stream_base_url.as_deref().unwrap_or(&self.base_url)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl PollingConfig {
    /// Polling interval of `source`, clamped to at least 100 ms.
    #[must_use]
    pub fn interval(&self, source: SourceId) -> Duration {
        let ms = match source {
            SourceId::Latest => self.latest_ms,
            SourceId::ReliabilityStatus => self.reliability_ms,
            SourceId::StreamHealth => self.stream_health_ms,
            SourceId::AlgorithmHealth => self.algorithm_health_ms,
            SourceId::CountingConfig => self.counting_config_ms,
            SourceId::SystemStatus => self.system_status_ms,
            SourceId::CountingAlerts | SourceId::StreamAlerts => self.alerts_ms,
            SourceId::ReliabilityConfig
            | SourceId::History
            | SourceId::Stats
            | SourceId::HealthCheck
            | SourceId::StreamStats => self.on_demand_ms,
        };
        Duration::from_millis(ms.max(MIN_INTERVAL_MS))
    }
}

// --- AppConfig methods ---

impl AppConfig {
    /// Load config from default path or create default config file
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined,
    /// the file cannot be read, or the TOML content is invalid.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_or_create(&path)
    }

    /// Load from a specific path, or create a default config file if missing
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is invalid,
    /// or the default config file cannot be written.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Load from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML content is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Save config to a specific path, creating parent directories if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created,
    /// serialization fails, or the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        let content = self.to_toml()?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Default config location: `<config dir>/crowdwatch/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("crowdwatch").join("config.toml"))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_has_sensible_values() {
        let config = AppConfig::default();
        assert_eq!(config.backend.base_url, "http://localhost:5000/api");
        assert!(config.backend.stream_base_url.is_none());
        assert_eq!(config.backend.timeout_secs, 10);
        assert_eq!(config.polling.latest_ms, 1000);
        assert_eq!(config.polling.reliability_ms, 5000);
        assert_eq!(config.polling.alerts_ms, 10_000);
        assert_eq!(config.cameras.count, 19);
        assert_eq!(config.cameras.expected_services, 3);
        assert_eq!(config.alerts.limit, 100);
        assert!(!config.alerts.unacknowledged_only);
        assert!(config.alerts.stream_alert_type.is_none());
    }

    #[test]
    fn serde_roundtrip() {
        let mut config = AppConfig::default();
        config.backend.stream_base_url = Some("http://recorder:8080/api".into());
        config.alerts.stream_alert_type = Some(StreamAlertType::Disconnected);
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let deserialized: AppConfig = toml::from_str(&toml_str).expect("deserialize");

        assert_eq!(deserialized.backend.base_url, config.backend.base_url);
        assert_eq!(
            deserialized.backend.stream_base_url,
            config.backend.stream_base_url
        );
        assert_eq!(deserialized.polling.latest_ms, config.polling.latest_ms);
        assert_eq!(
            deserialized.alerts.stream_alert_type,
            Some(StreamAlertType::Disconnected)
        );
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config: AppConfig = toml::from_str("").expect("parse empty toml");
        assert_eq!(config.polling.latest_ms, 1000);
        assert_eq!(config.cameras.count, 19);
    }

    #[test]
    fn partial_toml_fills_missing_with_defaults() {
        let toml_str = r#"
[backend]
base_url = "http://counting.local/api"

[polling]
latest_ms = 2000
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse partial toml");
        assert_eq!(config.backend.base_url, "http://counting.local/api");
        assert_eq!(config.backend.timeout_secs, 10);
        assert_eq!(config.polling.latest_ms, 2000);
        assert_eq!(config.polling.stream_health_ms, 5000);
    }

    #[test]
    fn stream_url_falls_back_to_base_url() {
        let mut backend = BackendConfig::default();
        assert_eq!(backend.stream_url(), "http://localhost:5000/api");
        backend.stream_base_url = Some("http://recorder/api".into());
        assert_eq!(backend.stream_url(), "http://recorder/api");
    }

    #[test]
    fn intervals_follow_source_cadence() {
        let polling = PollingConfig::default();
        assert_eq!(
            polling.interval(SourceId::Latest),
            Duration::from_millis(1000)
        );
        assert_eq!(
            polling.interval(SourceId::AlgorithmHealth),
            Duration::from_millis(5000)
        );
        assert_eq!(
            polling.interval(SourceId::CountingAlerts),
            Duration::from_millis(10_000)
        );
        assert_eq!(
            polling.interval(SourceId::StreamAlerts),
            Duration::from_millis(10_000)
        );
        assert_eq!(
            polling.interval(SourceId::History),
            Duration::from_millis(30_000)
        );
    }

    #[test]
    fn intervals_are_clamped() {
        let polling = PollingConfig {
            latest_ms: 0,
            ..PollingConfig::default()
        };
        assert_eq!(
            polling.interval(SourceId::Latest),
            Duration::from_millis(100)
        );
    }

    #[test]
    fn zero_timeout_is_raised_to_one_second() {
        let backend = BackendConfig {
            timeout_secs: 0,
            ..BackendConfig::default()
        };
        assert_eq!(backend.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn load_from_file() {
        let toml_str = r#"
[cameras]
count = 12

[alerts]
unacknowledged_only = true
stream_alert_type = "reconnected"
"#;
        let mut tmpfile = tempfile::NamedTempFile::new().expect("create tempfile");
        tmpfile
            .write_all(toml_str.as_bytes())
            .expect("write tmpfile");

        let config = AppConfig::load_from(tmpfile.path()).expect("load from file");
        assert_eq!(config.cameras.count, 12);
        assert!(config.alerts.unacknowledged_only);
        assert_eq!(
            config.alerts.stream_alert_type,
            Some(StreamAlertType::Reconnected)
        );
    }

    #[test]
    fn config_path_contains_crate_name() {
        let path = AppConfig::config_path().expect("config path");
        assert!(path.to_string_lossy().contains("crowdwatch"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_or_create_creates_default_when_missing() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let path = dir.path().join("crowdwatch").join("config.toml");

        assert!(!path.exists());
        let config = AppConfig::load_or_create(&path).expect("load_or_create");

        assert!(path.exists());
        assert_eq!(config.polling.latest_ms, 1000);

        let reloaded = AppConfig::load_from(&path).expect("reload created file");
        assert_eq!(reloaded.backend.base_url, config.backend.base_url);
    }

    #[test]
    fn load_or_create_loads_existing_file() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[backend]\ntimeout_secs = 3\n").expect("write");

        let config = AppConfig::load_or_create(&path).expect("load_or_create");
        assert_eq!(config.backend.timeout_secs, 3);
    }

    #[test]
    fn invalid_toml_fails() {
        let mut tmpfile = tempfile::NamedTempFile::new().expect("create tempfile");
        tmpfile
            .write_all(b"this is not valid toml [[[")
            .expect("write");

        let result = AppConfig::load_from(tmpfile.path());
        assert!(result.is_err());
    }

    #[test]
    fn unknown_stream_alert_type_is_other() {
        let config: AppConfig =
            toml::from_str("[alerts]\nstream_alert_type = \"jitter\"\n").expect("parse");
        assert_eq!(config.alerts.stream_alert_type, Some(StreamAlertType::Other));
    }
}
