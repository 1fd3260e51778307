#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Profile, threshold and signal types for the detection pipeline.
//!
//! A [`LocationProfile`] is the per-location summary of one horizon's
//! records. [`Thresholds`] are the cutoffs derived from a population of
//! profiles. Detectors turn profiles into [`DetectionResult`]s.

pub mod params;

use drishti_enrolment_models::LocationKey;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

pub use params::{
    BoomParams, DetectionParams, DigitalParams, FraudParams, GhostParams, HorizonWindows,
};

/// A lookback horizon. Each signal is computed over its own window.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Horizon {
    /// Short-term burst window, scored by the anomaly model.
    Fraud,
    /// Seasonal migration window.
    Boom,
    /// Structural aging window.
    Ghost,
    /// Digital adoption window.
    Digital,
}

/// Statistical summary of one location's records within a horizon.
///
/// Empty aggregates are stored as `0.0`, never NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationProfile {
    /// Location identity.
    pub key: LocationKey,
    /// Number of records aggregated.
    pub observations: usize,
    /// 75th percentile of daily velocity.
    pub velocity_q3: f64,
    /// Largest single-day velocity.
    pub max_velocity: f64,
    /// Sum of total enrolment.
    pub volume_sum: f64,
    /// Median of total enrolment (typical day).
    pub volume_median: f64,
    /// Median elderly pressure.
    pub elderly_pressure_median: f64,
    /// Mean child ratio.
    pub child_ratio_mean: f64,
    /// Fraction of records that fell on a weekend.
    pub weekend_activity: f64,
    /// Sum of biometric updates.
    pub bio_sum: f64,
    /// `bio_sum / (volume_sum + 1)`.
    pub bio_compliance_rate: f64,
}

/// Cutoffs computed from one horizon's profile population.
///
/// Only meaningful relative to the population they were computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Boom velocity cutoff.
    pub velocity_cutoff: f64,
    /// Median of `volume_sum` across locations.
    pub volume_sum_median: f64,
    /// Ghost elderly pressure cutoff.
    pub ghost_pressure_cutoff: f64,
    /// Median of `volume_median` across locations.
    pub volume_median_median: f64,
    /// Digital elderly pressure cutoff.
    pub digital_pressure_cutoff: f64,
    /// Digital biometric compliance cutoff.
    pub compliance_cutoff: f64,
}

/// A location flagged as a digital dark zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigitalDarkZone {
    /// The qualifying profile.
    pub profile: LocationProfile,
    /// Recommended intervention.
    pub recommended_action: String,
}

/// A location the anomaly model placed in the contamination tail.
///
/// Metrics are the raw (unscaled) values the explainer reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudSuspect {
    /// Location identity.
    pub key: LocationKey,
    /// Total enrolment in the horizon.
    pub total_txns: f64,
    /// 75th percentile of daily velocity.
    pub velocity_q3: f64,
    /// Largest single-day velocity.
    pub max_velocity: f64,
    /// Fraction of weekend records.
    pub weekend_activity: f64,
    /// Biometric compliance rate.
    pub bio_rate: f64,
    /// Model decision score; more negative is more anomalous.
    pub severity_score: f64,
    /// Human-readable explanation.
    pub risk_reason: String,
}

/// Outcome of cross-checking a suspect against boom town output.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum AuditStatus {
    /// Not explained by migration; needs investigation.
    #[serde(rename = "HIGH RISK - Action Required")]
    #[strum(serialize = "HIGH RISK - Action Required")]
    HighRisk,
    /// Location is also a boom town; the spike is migration.
    #[serde(rename = "SUPPRESSED - Verified Migration Context")]
    #[strum(serialize = "SUPPRESSED - Verified Migration Context")]
    Suppressed,
}

/// A suspect with its audit classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudAuditEntry {
    /// The model-flagged location.
    pub suspect: FraudSuspect,
    /// Classification after suppression.
    pub audit_status: AuditStatus,
}

/// Kind of governance signal.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SignalKind {
    /// Rapid adult in-migration.
    BoomTown,
    /// Aging, stagnant location.
    GhostVillage,
    /// Aging location with low biometric compliance.
    DigitalDarkZone,
    /// Anomaly model suspect.
    FraudSuspect,
}

/// One detected signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum DetectionResult {
    /// Boom town profile.
    BoomTown(LocationProfile),
    /// Ghost village profile.
    GhostVillage(LocationProfile),
    /// Digital dark zone.
    DigitalDarkZone(DigitalDarkZone),
    /// Audited fraud suspect.
    FraudSuspect(FraudAuditEntry),
}

impl DetectionResult {
    /// The signal kind.
    #[must_use]
    pub const fn signal(&self) -> SignalKind {
        match self {
            Self::BoomTown(_) => SignalKind::BoomTown,
            Self::GhostVillage(_) => SignalKind::GhostVillage,
            Self::DigitalDarkZone(_) => SignalKind::DigitalDarkZone,
            Self::FraudSuspect(_) => SignalKind::FraudSuspect,
        }
    }

    /// The flagged location.
    #[must_use]
    pub const fn key(&self) -> &LocationKey {
        match self {
            Self::BoomTown(p) | Self::GhostVillage(p) => &p.key,
            Self::DigitalDarkZone(z) => &z.profile.key,
            Self::FraudSuspect(e) => &e.suspect.key,
        }
    }
}
