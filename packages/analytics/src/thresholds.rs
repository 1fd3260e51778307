//! Data-derived cutoffs.
//!
//! Every cutoff is a percentile of the current horizon's profile
//! population. Nothing here is a fixed constant, so thresholds move with
//! the data and are not comparable across runs over different tables.

use drishti_analytics_models::{DetectionParams, LocationProfile, Thresholds};

use crate::stats::{or_zero, quantile_sorted};

/// Computes all cutoffs for one population of profiles.
///
/// An empty population yields all-zero thresholds.
#[must_use]
pub fn compute_thresholds(profiles: &[LocationProfile], params: &DetectionParams) -> Thresholds {
    let velocity = sorted_column(profiles, |p| p.velocity_q3);
    let volume_sum = sorted_column(profiles, |p| p.volume_sum);
    let volume_median = sorted_column(profiles, |p| p.volume_median);
    let pressure = sorted_column(profiles, |p| p.elderly_pressure_median);
    let compliance = sorted_column(profiles, |p| p.bio_compliance_rate);

    let at = |sorted: &[f64], q: f64| or_zero(quantile_sorted(sorted, q));

    Thresholds {
        velocity_cutoff: at(&velocity, params.boom.velocity_percentile),
        volume_sum_median: at(&volume_sum, 0.5),
        ghost_pressure_cutoff: at(&pressure, params.ghost.pressure_percentile),
        volume_median_median: at(&volume_median, 0.5),
        digital_pressure_cutoff: at(&pressure, params.digital.pressure_percentile),
        compliance_cutoff: at(&compliance, params.digital.compliance_percentile),
    }
}

fn sorted_column(profiles: &[LocationProfile], f: impl Fn(&LocationProfile) -> f64) -> Vec<f64> {
    let mut values: Vec<f64> = profiles.iter().map(f).collect();
    values.sort_by(f64::total_cmp);
    values
}
