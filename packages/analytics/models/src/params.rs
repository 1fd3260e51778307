//! Tunable detection parameters.
//!
//! Every field has a default, so a partially specified TOML section only
//! overrides what it names. Percentiles are fractions in `[0, 1]`.

use serde::{Deserialize, Serialize};

use crate::Horizon;

/// Lookback window, in days, for each horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorizonWindows {
    /// Short-term burst window for fraud detection.
    pub fraud_days: u32,
    /// Seasonal migration window for boom towns.
    pub boom_days: u32,
    /// Structural aging window for ghost villages.
    pub ghost_days: u32,
    /// Adoption curve window for digital dark zones.
    pub digital_days: u32,
}

impl Default for HorizonWindows {
    fn default() -> Self {
        Self {
            fraud_days: 30,
            boom_days: 180,
            ghost_days: 365 * 3,
            digital_days: 365,
        }
    }
}

impl HorizonWindows {
    /// Window length for `horizon`.
    #[must_use]
    pub const fn days(&self, horizon: Horizon) -> u32 {
        match horizon {
            Horizon::Fraud => self.fraud_days,
            Horizon::Boom => self.boom_days,
            Horizon::Ghost => self.ghost_days,
            Horizon::Digital => self.digital_days,
        }
    }
}

/// Boom town rule parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoomParams {
    /// Velocity cutoff percentile (top 5% by default).
    pub velocity_percentile: f64,
    /// Total volume a location must exceed to qualify.
    pub noise_floor: f64,
    /// Mean child ratio must stay below this (adult-dominated inflow).
    pub max_child_ratio: f64,
}

impl Default for BoomParams {
    fn default() -> Self {
        Self {
            velocity_percentile: 0.95,
            noise_floor: 10.0,
            max_child_ratio: 0.3,
        }
    }
}

/// Ghost village rule parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GhostParams {
    /// Elderly pressure cutoff percentile (top 10% by default).
    pub pressure_percentile: f64,
}

impl Default for GhostParams {
    fn default() -> Self {
        Self {
            pressure_percentile: 0.90,
        }
    }
}

/// Digital dark zone rule parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigitalParams {
    /// Elderly pressure cutoff percentile (top 20% by default).
    pub pressure_percentile: f64,
    /// Biometric compliance cutoff percentile (bottom 25% by default).
    pub compliance_percentile: f64,
    /// Total volume a location must exceed to qualify.
    pub noise_floor: f64,
    /// Label attached to every qualifying location in a multi-horizon run.
    pub action: String,
    /// Label attached to the full-history policy overlay.
    pub full_history_action: String,
}

impl Default for DigitalParams {
    fn default() -> Self {
        Self {
            pressure_percentile: 0.80,
            compliance_percentile: 0.25,
            noise_floor: 50.0,
            action: "Deploy Digital Sahayak".to_string(),
            full_history_action: "Deploy Mobile Aadhaar Vans + Assisted Digital Camps".to_string(),
        }
    }
}

/// Fraud anomaly model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FraudParams {
    /// Total volume a location must exceed to be scored at all.
    pub noise_floor: f64,
    /// Scoring floor for a full-history run, where volumes span every date.
    pub full_history_noise_floor: f64,
    /// Expected anomaly fraction.
    pub contamination: f64,
    /// Model RNG seed.
    pub seed: u64,
    /// Number of isolation trees.
    pub n_estimators: usize,
    /// Per-tree subsample cap.
    pub max_samples: usize,
}

impl Default for FraudParams {
    fn default() -> Self {
        Self {
            noise_floor: 10.0,
            full_history_noise_floor: 50.0,
            contamination: 0.01,
            seed: 42,
            n_estimators: 100,
            max_samples: 256,
        }
    }
}

/// All detector parameters for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParams {
    /// Boom town rule.
    pub boom: BoomParams,
    /// Ghost village rule.
    pub ghost: GhostParams,
    /// Digital dark zone rule.
    pub digital: DigitalParams,
    /// Fraud anomaly model.
    pub fraud: FraudParams,
}

impl DetectionParams {
    /// Parameters for a full-history run: the fraud floor and the digital
    /// action label switch to their full-history values.
    #[must_use]
    pub fn for_full_history(&self) -> Self {
        let mut params = self.clone();
        params.fraud.noise_floor = self.fraud.full_history_noise_floor;
        params.digital.action.clone_from(&self.digital.full_history_action);
        params
    }
}
