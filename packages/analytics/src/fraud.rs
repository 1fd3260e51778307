//! Model-based fraud suspect detection.

use drishti_analytics_models::{FraudParams, FraudSuspect, LocationProfile};
use drishti_anomaly::{ForestParams, detect_outliers};

use crate::AnalyticsError;
use crate::explain::{SuspectMetrics, explain};

/// Names of the model input columns, in row order.
pub const FEATURE_NAMES: [&str; 4] = [
    "velocity_q3",
    "max_velocity",
    "weekend_activity",
    "bio_compliance_rate",
];

/// Model input row for one profile.
#[must_use]
pub fn feature_row(p: &LocationProfile) -> Vec<f64> {
    vec![
        p.velocity_q3,
        p.max_velocity,
        p.weekend_activity,
        p.bio_compliance_rate,
    ]
}

const fn forest_params(params: &FraudParams) -> ForestParams {
    ForestParams {
        n_estimators: params.n_estimators,
        max_samples: params.max_samples,
        contamination: params.contamination,
        seed: params.seed,
    }
}

/// Scores active profiles and returns the anomalous ones, explained.
///
/// Only profiles with `volume_sum` above the fraud noise floor are scored.
/// Suspects come back most anomalous first. The result is fully
/// determined by `profiles` and `params.seed`.
///
/// # Errors
///
/// * If the model parameters are out of range
pub fn detect_fraud_suspects(
    profiles: &[LocationProfile],
    params: &FraudParams,
) -> Result<Vec<FraudSuspect>, AnalyticsError> {
    let active: Vec<&LocationProfile> = profiles
        .iter()
        .filter(|p| p.volume_sum > params.noise_floor)
        .collect();

    if active.is_empty() {
        log::warn!("No locations above the fraud noise floor; skipping model");
        return Ok(Vec::new());
    }

    let rows: Vec<Vec<f64>> = active.iter().map(|p| feature_row(p)).collect();
    log::debug!("Scoring {} locations on {FEATURE_NAMES:?}", rows.len());
    let outcomes = detect_outliers(&rows, &forest_params(params))?;

    let mut suspects: Vec<FraudSuspect> = active
        .into_iter()
        .zip(outcomes)
        .filter(|(_, outcome)| outcome.is_anomaly)
        .map(|(p, outcome)| {
            let metrics = SuspectMetrics {
                weekend_activity: p.weekend_activity,
                velocity_q3: p.velocity_q3,
                bio_rate: p.bio_compliance_rate,
                max_velocity: p.max_velocity,
            };
            FraudSuspect {
                key: p.key.clone(),
                total_txns: p.volume_sum,
                velocity_q3: p.velocity_q3,
                max_velocity: p.max_velocity,
                weekend_activity: p.weekend_activity,
                bio_rate: p.bio_compliance_rate,
                severity_score: outcome.severity,
                risk_reason: explain(&metrics),
            }
        })
        .collect();

    suspects.sort_by(|a, b| a.severity_score.total_cmp(&b.severity_score));

    log::info!(
        "Anomaly model flagged {} suspects among {} active locations",
        suspects.len(),
        rows.len()
    );

    Ok(suspects)
}

#[cfg(test)]
mod tests {
    use drishti_enrolment_models::LocationKey;

    use super::*;

    #[allow(clippy::cast_precision_loss)]
    fn population(n: usize) -> Vec<LocationProfile> {
        (0..n)
            .map(|i| {
                let jitter = (i % 7) as f64 * 0.1;
                LocationProfile {
                    key: LocationKey::new("Bihar", "Patna", &format!("{}", 800_000 + i)),
                    observations: 30,
                    velocity_q3: 2.0 + jitter,
                    max_velocity: 8.0 + jitter,
                    volume_sum: 300.0,
                    volume_median: 10.0,
                    elderly_pressure_median: 0.5,
                    child_ratio_mean: 0.3,
                    weekend_activity: 0.28 + jitter / 10.0,
                    bio_sum: 150.0,
                    bio_compliance_rate: 0.5 + jitter / 10.0,
                }
            })
            .collect()
    }

    fn outlier(pincode: &str) -> LocationProfile {
        LocationProfile {
            key: LocationKey::new("Bihar", "Patna", pincode),
            observations: 30,
            velocity_q3: 90.0,
            max_velocity: 900.0,
            volume_sum: 5000.0,
            volume_median: 150.0,
            elderly_pressure_median: 0.1,
            child_ratio_mean: 0.05,
            weekend_activity: 0.9,
            bio_sum: 1.0,
            bio_compliance_rate: 0.0002,
        }
    }

    #[test]
    fn extreme_location_is_flagged_and_explained() {
        let mut profiles = population(199);
        profiles.push(outlier("899999"));

        let suspects = detect_fraud_suspects(&profiles, &FraudParams::default()).unwrap();

        let top = &suspects[0];
        assert_eq!(top.key.pincode, "899999");
        assert!(top.severity_score < 0.0);
        assert_eq!(
            top.risk_reason,
            "Suspicious Weekend Activity, Sustained High Speed, \
             Abnormally Low Bio Updates, Impossible Speed Spike"
        );
        assert!((top.total_txns - 5000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let mut profiles = population(150);
        profiles.push(outlier("899998"));
        let params = FraudParams::default();

        let first = detect_fraud_suspects(&profiles, &params).unwrap();
        let second = detect_fraud_suspects(&profiles, &params).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn quiet_locations_are_never_scored() {
        let mut profiles = population(50);
        let mut hidden = outlier("899997");
        hidden.volume_sum = 10.0;
        profiles.push(hidden);

        let suspects = detect_fraud_suspects(&profiles, &FraudParams::default()).unwrap();
        assert!(suspects.iter().all(|s| s.key.pincode != "899997"));
    }

    #[test]
    fn no_active_locations_yields_no_suspects() {
        let mut profiles = population(5);
        for p in &mut profiles {
            p.volume_sum = 3.0;
        }
        assert!(
            detect_fraud_suspects(&profiles, &FraudParams::default())
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn invalid_contamination_is_an_error() {
        let params = FraudParams {
            contamination: 0.0,
            ..FraudParams::default()
        };
        assert!(detect_fraud_suspects(&population(10), &params).is_err());
    }

    #[test]
    fn suspects_sorted_most_anomalous_first() {
        let mut profiles = population(300);
        profiles.push(outlier("899996"));
        profiles.push(outlier("899995"));
        let params = FraudParams {
            contamination: 0.05,
            ..FraudParams::default()
        };
        let suspects = detect_fraud_suspects(&profiles, &params).unwrap();
        assert!(
            suspects
                .windows(2)
                .all(|w| w[0].severity_score <= w[1].severity_score)
        );
    }
}
