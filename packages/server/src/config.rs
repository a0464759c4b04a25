//! Server configuration.
//!
//! Loaded from an optional TOML file. Every table and field has a default,
//! so an empty (or absent) file yields the standard configuration.
//!
//! ```toml
//! [scoring.weights]
//! air_quality = 0.40
//! water_security = 0.35
//! green_space = 0.25
//!
//! [alerts]
//! air_quality_danger = 150.0
//!
//! [query]
//! reading_radius = 0.1
//! livability_window_hours = 24
//!
//! [ai]
//! enabled = true
//! timeout_secs = 20
//! ```

use std::path::{Path, PathBuf};

use envirolens_alert_models::AlertThresholds;
use envirolens_scoring_models::{ScoringConfig, ScoringConfigError};
use serde::Deserialize;

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The scoring weights are invalid.
    #[error("Invalid scoring configuration: {0}")]
    Scoring(#[from] ScoringConfigError),
}

/// Radii, windows, and limits used by the API handlers.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Half-width in degrees of the box used for reading lookups.
    pub reading_radius: f64,
    /// Half-width in degrees of the box used for score lookups.
    pub score_radius: f64,
    /// How far back livability scoring looks, in hours.
    pub livability_window_hours: u32,
    /// How far back alert generation looks, in hours.
    pub alert_window_hours: u32,
    /// Maximum number of alerts on the dashboard.
    pub dashboard_alert_limit: u32,
    /// Maximum number of historical readings per category on the dashboard.
    pub history_limit: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            reading_radius: 0.1,
            score_radius: 0.01,
            livability_window_hours: 24,
            alert_window_hours: 6,
            dashboard_alert_limit: 10,
            history_limit: 24,
        }
    }
}

impl QueryConfig {
    /// The livability lookback window.
    #[must_use]
    pub fn livability_window(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.livability_window_hours))
    }

    /// The alert lookback window.
    #[must_use]
    pub fn alert_window(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.alert_window_hours))
    }
}

/// Language model settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Whether to use a language model for alert recommendations when
    /// credentials are available.
    pub enabled: bool,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 20,
        }
    }
}

impl AiConfig {
    /// The per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnvirolensConfig {
    /// Livability scoring.
    pub scoring: ScoringConfig,
    /// Alert thresholds.
    pub alerts: AlertThresholds,
    /// Query radii, windows, and limits.
    pub query: QueryConfig,
    /// Language model settings.
    pub ai: AiConfig,
}

impl EnvirolensConfig {
    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not valid TOML for this schema
    /// or the scoring weights are invalid.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.scoring.weights.validate()?;
        Ok(config)
    }

    /// Loads configuration from `path`, or the defaults when `path` is
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            log::info!("No config file given, using defaults");
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        log::info!("Loaded config from {}", path.display());

        Self::from_toml(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = EnvirolensConfig::from_toml("").unwrap();
        assert_eq!(config, EnvirolensConfig::default());
        assert_eq!(config.query.alert_window_hours, 6);
        assert!((config.scoring.weights.air_quality - 0.40).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_tables_keep_remaining_defaults() {
        let config = EnvirolensConfig::from_toml(
            "[query]\nhistory_limit = 48\n\n[ai]\nenabled = false\n\n[alerts]\nflood_risk_danger = 80.0\n",
        )
        .unwrap();
        assert_eq!(config.query.history_limit, 48);
        assert!((config.query.reading_radius - 0.1).abs() < f64::EPSILON);
        assert!(!config.ai.enabled);
        assert_eq!(config.ai.timeout_secs, 20);
        assert!((config.alerts.flood_risk_danger - 80.0).abs() < f64::EPSILON);
        assert!((config.alerts.flood_risk_warning - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_weights_not_summing_to_one() {
        let err = EnvirolensConfig::from_toml(
            "[scoring.weights]\nair_quality = 0.5\nwater_security = 0.5\ngreen_space = 0.5\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Scoring(ScoringConfigError::WeightSum { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join(format!("envirolens_missing_{}.toml", uuid::Uuid::new_v4()));
        assert!(matches!(
            EnvirolensConfig::load(Some(&path)),
            Err(ConfigError::Io { .. })
        ));
        assert_eq!(EnvirolensConfig::load(None).unwrap(), EnvirolensConfig::default());
    }
}
