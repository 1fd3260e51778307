//! Rule-based detectors.
//!
//! Each detector is a conjunction of threshold predicates over one
//! profile. Output is sorted descending by the primary triggering metric;
//! equal metrics keep key order.

use drishti_analytics_models::{
    BoomParams, DigitalDarkZone, DigitalParams, LocationProfile, Thresholds,
};

/// Whether `p` shows the adult in-migration signature.
#[must_use]
pub fn is_boom_town(p: &LocationProfile, t: &Thresholds, params: &BoomParams) -> bool {
    p.velocity_q3 > t.velocity_cutoff
        && p.volume_sum > t.volume_sum_median
        && p.volume_sum > params.noise_floor
        && p.child_ratio_mean < params.max_child_ratio
}

/// Whether `p` is aging with stagnant typical-day activity.
#[must_use]
pub fn is_ghost_village(p: &LocationProfile, t: &Thresholds) -> bool {
    p.elderly_pressure_median > t.ghost_pressure_cutoff
        && p.volume_median <= t.volume_median_median
}

/// Whether `p` is aging with poor biometric compliance.
#[must_use]
pub fn is_digital_dark_zone(p: &LocationProfile, t: &Thresholds, params: &DigitalParams) -> bool {
    p.elderly_pressure_median > t.digital_pressure_cutoff
        && p.bio_compliance_rate < t.compliance_cutoff
        && p.volume_sum > params.noise_floor
}

/// Boom towns, highest `velocity_q3` first.
#[must_use]
pub fn detect_boom_towns(
    profiles: &[LocationProfile],
    thresholds: &Thresholds,
    params: &BoomParams,
) -> Vec<LocationProfile> {
    let mut hits: Vec<LocationProfile> = profiles
        .iter()
        .filter(|p| is_boom_town(p, thresholds, params))
        .cloned()
        .collect();
    hits.sort_by(|a, b| b.velocity_q3.total_cmp(&a.velocity_q3));
    log::debug!("{} boom towns of {} locations", hits.len(), profiles.len());
    hits
}

/// Ghost villages, highest elderly pressure first.
#[must_use]
pub fn detect_ghost_villages(
    profiles: &[LocationProfile],
    thresholds: &Thresholds,
) -> Vec<LocationProfile> {
    let mut hits: Vec<LocationProfile> = profiles
        .iter()
        .filter(|p| is_ghost_village(p, thresholds))
        .cloned()
        .collect();
    hits.sort_by(|a, b| b.elderly_pressure_median.total_cmp(&a.elderly_pressure_median));
    log::debug!("{} ghost villages of {} locations", hits.len(), profiles.len());
    hits
}

/// Digital dark zones, highest elderly pressure first, each carrying the
/// configured action label.
#[must_use]
pub fn detect_digital_dark_zones(
    profiles: &[LocationProfile],
    thresholds: &Thresholds,
    params: &DigitalParams,
) -> Vec<DigitalDarkZone> {
    let mut hits: Vec<DigitalDarkZone> = profiles
        .iter()
        .filter(|p| is_digital_dark_zone(p, thresholds, params))
        .map(|p| DigitalDarkZone {
            profile: p.clone(),
            recommended_action: params.action.clone(),
        })
        .collect();
    hits.sort_by(|a, b| {
        b.profile
            .elderly_pressure_median
            .total_cmp(&a.profile.elderly_pressure_median)
    });
    log::debug!("{} digital dark zones of {} locations", hits.len(), profiles.len());
    hits
}
