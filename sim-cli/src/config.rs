//! Configuration loading for launchsim.
//!
//! Configuration is loaded from a TOML file (default: `launchsim.toml`).
//! A missing file means every default applies.

use serde::Deserialize;
use sim_core::RunnerOptions;
use sim_env::{NetworkSettings, MAX_LATENCY_SCALE};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration for launchsim.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Scenario runner configuration.
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Network simulation configuration.
    #[serde(default)]
    pub network: NetworkConfig,
    /// Report output configuration.
    #[serde(default)]
    pub report: ReportConfig,
    /// Device journey configuration.
    #[serde(default)]
    pub devices: DevicesConfig,
}

/// Scenario runner configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunnerConfig {
    /// Mirror scenario logs to the console (default: on in debug builds).
    pub mirror_logs: Option<bool>,
    /// Deadline for steps that do not set their own (default: none).
    pub step_timeout_ms: Option<u64>,
}

/// Network simulation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// Multiplier on profile latency and transfer time (default: 1.0).
    #[serde(default = "default_latency_scale")]
    pub latency_scale: f64,
    /// Seed for packet loss (default: random).
    pub seed: Option<u64>,
}

/// Report output configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Directory reports are written to (default: `simulation-reports`).
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Write the HTML report next to the JSON one (default: true).
    #[serde(default = "default_write_html")]
    pub write_html: bool,
}

/// Device journey configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DevicesConfig {
    /// Devices the smoke journey runs on.
    #[serde(default = "default_journeys")]
    pub journeys: Vec<String>,
}

// Default value functions
fn default_latency_scale() -> f64 {
    1.0
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("simulation-reports")
}

fn default_write_html() -> bool {
    true
}

fn default_journeys() -> Vec<String> {
    sim_scenarios::DEFAULT_SMOKE_DEVICES
        .iter()
        .map(|d| d.to_string())
        .collect()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            latency_scale: default_latency_scale(),
            seed: None,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            write_html: default_write_html(),
        }
    }
}

impl Default for DevicesConfig {
    fn default() -> Self {
        Self {
            journeys: default_journeys(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate().map_err(|reason| ConfigError::InvalidValue {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(config)
    }

    /// Check values the type system cannot.
    pub fn validate(&self) -> Result<(), String> {
        let scale = self.network.latency_scale;
        if !scale.is_finite() || !(0.0..=MAX_LATENCY_SCALE).contains(&scale) {
            return Err(format!(
                "network.latency_scale must be between 0 and {MAX_LATENCY_SCALE}, got {scale}"
            ));
        }
        Ok(())
    }

    /// Load `path` if it exists, otherwise return the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Runner options derived from `[runner]`.
    pub fn runner_options(&self) -> RunnerOptions {
        let defaults = RunnerOptions::default();
        RunnerOptions {
            mirror_to_console: self.runner.mirror_logs.unwrap_or(defaults.mirror_to_console),
            default_step_timeout: self.runner.step_timeout_ms.map(Duration::from_millis),
        }
    }

    /// Network settings derived from `[network]`.
    pub fn network_settings(&self) -> NetworkSettings {
        NetworkSettings {
            latency_scale: self.network.latency_scale,
            seed: self.network.seed,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A value parsed but is out of range.
    #[error("invalid config file {path}: {reason}")]
    InvalidValue {
        /// Path to the configuration file.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.network.latency_scale, 1.0);
        assert_eq!(config.report.output_dir, PathBuf::from("simulation-reports"));
        assert!(config.report.write_html);
        assert_eq!(config.devices.journeys, ["iphone_se", "low_end_android"]);
        assert!(config.runner_options().default_step_timeout.is_none());
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
[runner]
mirror_logs = true
step_timeout_ms = 30000

[network]
latency_scale = 0.1
seed = 7

[report]
output_dir = "out/reports"
write_html = false

[devices]
journeys = ["pixel_7", "ipad_air"]
"#;

        let config: Config = toml::from_str(toml).unwrap();
        let options = config.runner_options();
        assert!(options.mirror_to_console);
        assert_eq!(options.default_step_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.network_settings().latency_scale, 0.1);
        assert_eq!(config.network_settings().seed, Some(7));
        assert_eq!(config.report.output_dir, PathBuf::from("out/reports"));
        assert!(!config.report.write_html);
        assert_eq!(config.devices.journeys, ["pixel_7", "ipad_air"]);
    }

    #[test]
    fn config_missing_fields_use_defaults() {
        let toml = r#"
[network]
seed = 1
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.network.latency_scale, 1.0);
        assert!(config.report.write_html);
        assert_eq!(config.devices.journeys.len(), 2);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("launchsim.toml")).unwrap();
        assert_eq!(config.network.latency_scale, 1.0);
    }

    #[test]
    fn bad_toml_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("launchsim.toml");
        std::fs::write(&path, "[network\nlatency_scale = ").unwrap();

        let err = Config::load_or_default(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("launchsim.toml"));
    }

    #[test]
    fn out_of_range_latency_scale_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("launchsim.toml");

        for value in ["-1.0", "nan", "inf", "1e9"] {
            std::fs::write(&path, format!("[network]\nlatency_scale = {value}\n")).unwrap();
            let err = Config::from_file(&path).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { .. }),
                "{value}: {err}"
            );
            assert!(err.to_string().contains("latency_scale"));
        }

        std::fs::write(&path, "[network]\nlatency_scale = 0.0\n").unwrap();
        assert_eq!(Config::from_file(&path).unwrap().network.latency_scale, 0.0);
    }
}
