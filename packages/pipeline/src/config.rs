//! Run configuration loaded from TOML.
//!
//! Sections: `[horizons]`, `[boom]`, `[ghost]`, `[digital]`, `[fraud]`.
//! Every field has a default, so an empty file (or no file) is valid.

use std::path::{Path, PathBuf};

use drishti_analytics_models::{DetectionParams, HorizonWindows};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`PipelineConfig`].
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("Invalid config value '{field}': {message}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Complete tunable configuration for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Lookback window per horizon.
    pub horizons: HorizonWindows,
    /// Detector parameters (`[boom]`, `[ghost]`, `[digital]`, `[fraud]`).
    #[serde(flatten)]
    pub detection: DetectionParams,
}

impl PipelineConfig {
    /// Loads and validates the config at `path`, or the defaults when
    /// `path` is `None`.
    ///
    /// # Errors
    ///
    /// * If the file cannot be read or parsed
    /// * If any value fails [`PipelineConfig::validate`]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            log::info!("No config file given; using defaults");
            return Ok(Self::default());
        };

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&contents)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// * If the document is not valid TOML for this type
    /// * If any value fails [`PipelineConfig::validate`]
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Replaces the model seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.detection.fraud.seed = seed;
        self
    }

    /// Checks every value is within its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let windows = [
            ("horizons.fraud_days", self.horizons.fraud_days),
            ("horizons.boom_days", self.horizons.boom_days),
            ("horizons.ghost_days", self.horizons.ghost_days),
            ("horizons.digital_days", self.horizons.digital_days),
        ];
        for (field, days) in windows {
            if days == 0 {
                return Err(invalid(field, "window must be at least one day"));
            }
        }

        let d = &self.detection;
        let fractions = [
            ("boom.velocity_percentile", d.boom.velocity_percentile),
            ("boom.max_child_ratio", d.boom.max_child_ratio),
            ("ghost.pressure_percentile", d.ghost.pressure_percentile),
            ("digital.pressure_percentile", d.digital.pressure_percentile),
            ("digital.compliance_percentile", d.digital.compliance_percentile),
        ];
        for (field, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, format!("{value} is outside [0, 1]")));
            }
        }

        let floors = [
            ("boom.noise_floor", d.boom.noise_floor),
            ("digital.noise_floor", d.digital.noise_floor),
            ("fraud.noise_floor", d.fraud.noise_floor),
            (
                "fraud.full_history_noise_floor",
                d.fraud.full_history_noise_floor,
            ),
        ];
        for (field, value) in floors {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, format!("{value} must be a non-negative number")));
            }
        }

        if !(d.fraud.contamination > 0.0 && d.fraud.contamination <= 0.5) {
            return Err(invalid(
                "fraud.contamination",
                format!("{} is outside (0, 0.5]", d.fraud.contamination),
            ));
        }
        if d.fraud.n_estimators == 0 {
            return Err(invalid("fraud.n_estimators", "must be at least 1"));
        }
        if d.fraud.max_samples == 0 {
            return Err(invalid("fraud.max_samples", "must be at least 1"));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(
            PipelineConfig::from_toml("").unwrap(),
            PipelineConfig::default()
        );
    }

    #[test]
    fn sections_override_named_fields_only() {
        let config = PipelineConfig::from_toml(
            r#"
            [horizons]
            fraud_days = 14

            [digital]
            action = "Open camp"

            [fraud]
            seed = 7
            contamination = 0.05
            "#,
        )
        .unwrap();

        assert_eq!(config.horizons.fraud_days, 14);
        assert_eq!(config.horizons.boom_days, 180);
        assert_eq!(config.detection.digital.action, "Open camp");
        assert!((config.detection.digital.noise_floor - 50.0).abs() < f64::EPSILON);
        assert_eq!(config.detection.fraud.seed, 7);
        assert_eq!(config.detection.fraud.n_estimators, 100);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let cases = [
            ("[horizons]\nghost_days = 0\n", "horizons.ghost_days"),
            ("[boom]\nvelocity_percentile = 1.5\n", "boom.velocity_percentile"),
            ("[digital]\nnoise_floor = -1.0\n", "digital.noise_floor"),
            ("[fraud]\ncontamination = 0.7\n", "fraud.contamination"),
            (
                "[fraud]\nfull_history_noise_floor = -5.0\n",
                "fraud.full_history_noise_floor",
            ),
            ("[fraud]\nn_estimators = 0\n", "fraud.n_estimators"),
        ];
        for (doc, expected) in cases {
            match PipelineConfig::from_toml(doc) {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected),
                other => panic!("{doc:?}: expected invalid {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            PipelineConfig::from_toml("[fraud\nseed = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn shipped_config_spells_out_the_defaults() {
        let shipped = include_str!("../../../config/drishti.toml");
        assert_eq!(
            PipelineConfig::from_toml(shipped).unwrap(),
            PipelineConfig::default()
        );
    }

    #[test]
    fn seed_override() {
        let config = PipelineConfig::default().with_seed(99);
        assert_eq!(config.detection.fraud.seed, 99);
    }

    #[test]
    fn load_reads_file_and_defaults_without_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drishti.toml");
        std::fs::write(&path, "[ghost]\npressure_percentile = 0.75\n").unwrap();

        let config = PipelineConfig::load(Some(&path)).unwrap();
        assert!((config.detection.ghost.pressure_percentile - 0.75).abs() < f64::EPSILON);
        assert_eq!(PipelineConfig::load(None).unwrap(), PipelineConfig::default());

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            PipelineConfig::load(Some(&missing)),
            Err(ConfigError::Read { .. })
        ));
    }
}
