#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Enrolment activity types shared across the drishti toolchain.
//!
//! An [`EnrolmentRecord`] is one (date, location) observation from the
//! master table. The feature deriver turns each into a [`DerivedRecord`],
//! which is the unit every horizon slices and aggregates.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identity of a location: `(state, district, pincode)`.
///
/// Every aggregation and join in the pipeline keys on this type, so the
/// components are normalized once on construction. Two spellings that only
/// differ in surrounding or repeated whitespace compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocationKey {
    /// State or union territory name.
    pub state: String,
    /// District name.
    pub district: String,
    /// Postal index number.
    pub pincode: String,
}

impl LocationKey {
    /// Builds a normalized key.
    ///
    /// Pincodes that were round-tripped through a float column (e.g.
    /// `"110001.0"`) are reduced to their integer spelling.
    #[must_use]
    pub fn new(state: &str, district: &str, pincode: &str) -> Self {
        Self {
            state: collapse_whitespace(state),
            district: collapse_whitespace(district),
            pincode: normalize_pincode(pincode),
        }
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.state, self.district, self.pincode)
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_pincode(s: &str) -> String {
    let trimmed = s.trim();
    trimmed
        .strip_suffix(".0")
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(trimmed)
        .to_string()
}

/// One row of the master enrolment table after column renaming.
///
/// Counts are `f64` because the upstream merge fills gaps from outer
/// joins, and a missing count is carried as `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrolmentRecord {
    /// Observation date.
    pub date: NaiveDate,
    /// Location of the observation.
    pub key: LocationKey,
    /// New enrolments aged 0-5.
    pub age_0_5: f64,
    /// New enrolments aged 5-17.
    pub age_5_17: f64,
    /// New enrolments aged 18 and over.
    pub age_18_plus: f64,
    /// Demographic updates, younger bracket (5-17).
    pub demo_young: f64,
    /// Demographic updates, older bracket (17+).
    pub demo_old: f64,
    /// Biometric updates, younger bracket (5-17).
    pub bio_young: f64,
    /// Biometric updates, older bracket (17+).
    pub bio_old: f64,
}

/// An [`EnrolmentRecord`] with its per-record metrics computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedRecord {
    /// The raw observation.
    pub record: EnrolmentRecord,
    /// `age_0_5 + age_5_17 + age_18_plus`.
    pub total_enrolment: f64,
    /// `bio_young + bio_old`.
    pub total_bio_updates: f64,
    /// `age_0_5 / (total_enrolment + 1)`.
    pub child_ratio: f64,
    /// `demo_old / (demo_young + 1)`. An aging proxy, not an age ratio.
    pub elderly_pressure: f64,
    /// Change in `total_enrolment` since the previous observation of the
    /// same location. Zero for the first observation.
    pub enrol_velocity: f64,
    /// Whether the observation fell on a Saturday or Sunday.
    pub is_weekend: bool,
    /// Calendar month, 1-12.
    pub month: u32,
}

impl DerivedRecord {
    /// Observation date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.record.date
    }

    /// Location of the observation.
    #[must_use]
    pub const fn key(&self) -> &LocationKey {
        &self.record.key
    }
}
