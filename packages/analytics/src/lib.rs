#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Detection engine for enrolment governance signals.
//!
//! Each horizon runs the same sequence: slice the derived table to the
//! window, aggregate per location, derive thresholds from that population,
//! then classify. Rule detectors cover boom towns, ghost villages and
//! digital dark zones. The fraud horizon goes through the isolation forest
//! and is then cross-checked against boom town output.

pub mod aggregate;
pub mod detect;
pub mod explain;
pub mod fraud;
pub mod horizon;
pub mod stats;
pub mod suppression;
pub mod thresholds;

use thiserror::Error;

pub use aggregate::aggregate;
pub use detect::{detect_boom_towns, detect_digital_dark_zones, detect_ghost_villages};
pub use fraud::detect_fraud_suspects;
pub use horizon::{reference_date, slice_window};
pub use suppression::merge;
pub use thresholds::compute_thresholds;

/// Errors that can occur during detection.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Anomaly model failed.
    #[error("Anomaly model error: {0}")]
    Anomaly(#[from] drishti_anomaly::AnomalyError),
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};
    use drishti_analytics_models::{AuditStatus, DetectionParams, FraudSuspect};
    use drishti_enrolment_models::{EnrolmentRecord, LocationKey};
    use drishti_features::derive_features;

    use super::*;

    fn record(pincode: &str, date: NaiveDate, kids: f64, adults: f64, bio: f64) -> EnrolmentRecord {
        EnrolmentRecord {
            date,
            key: LocationKey::new("Rajasthan", "Jaipur", pincode),
            age_0_5: kids,
            age_5_17: 0.0,
            age_18_plus: adults,
            demo_young: kids,
            demo_old: adults,
            bio_young: 0.0,
            bio_old: bio,
        }
    }

    /// Twenty ordinary locations, one flat aging location and one recent
    /// location whose daily total jumps from 5 to 500.
    fn scenario() -> Vec<EnrolmentRecord> {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let mut rows = Vec::new();
        for day in 0..20_i64 {
            let date = start + Duration::days(day);
            for loc in 0..20_i64 {
                let adults = 5.0 + f64::from(u8::try_from((loc + day) % 4).unwrap());
                rows.push(record(&format!("30200{loc:02}"), date, 4.0, adults, 3.0));
            }
            rows.push(record("3029990", date, 0.0, 3.0, 0.0));
            if day >= 16 {
                let adults = if day == 19 { 499.0 } else { 4.0 };
                rows.push(record("3028880", date, 1.0, adults, 2.0));
            }
        }
        rows
    }

    #[test]
    fn flat_aging_location_is_ghost_not_boom() {
        let derived = derive_features(scenario());
        let profiles = aggregate(&derived);
        let params = DetectionParams::default();
        let thresholds = compute_thresholds(&profiles, &params);

        let ghosts = detect_ghost_villages(&profiles, &thresholds);
        let booms = detect_boom_towns(&profiles, &thresholds, &params.boom);

        assert!(ghosts.iter().any(|p| p.key.pincode == "3029990"));
        assert!(booms.iter().all(|p| p.key.pincode != "3029990"));
    }

    #[test]
    fn single_day_jump_is_boom() {
        let derived = derive_features(scenario());
        let profiles = aggregate(&derived);
        let params = DetectionParams::default();
        let thresholds = compute_thresholds(&profiles, &params);

        let booms = detect_boom_towns(&profiles, &thresholds, &params.boom);
        assert_eq!(booms.len(), 1);
        assert_eq!(booms[0].key.pincode, "3028880");
    }

    #[test]
    fn suspect_in_boom_output_is_suppressed() {
        let derived = derive_features(scenario());
        let profiles = aggregate(&derived);
        let params = DetectionParams::default();
        let thresholds = compute_thresholds(&profiles, &params);
        let booms = detect_boom_towns(&profiles, &thresholds, &params.boom);

        let suspect = FraudSuspect {
            key: LocationKey::new("Rajasthan", "Jaipur", "3028880"),
            total_txns: 0.0,
            velocity_q3: 0.0,
            max_velocity: 0.0,
            weekend_activity: 0.0,
            bio_rate: 0.0,
            severity_score: -0.2,
            risk_reason: String::new(),
        };
        let audit = merge(vec![suspect], Some(booms.as_slice()));
        assert_eq!(audit[0].audit_status, AuditStatus::Suppressed);
    }
}
