//! Per-location aggregation.
//!
//! Collapses a horizon's records into one [`LocationProfile`] per location.
//! Velocity uses the 75th percentile and volume/pressure the median so a
//! single-day spike cannot carry a location on its own.

use std::collections::BTreeMap;

use drishti_analytics_models::LocationProfile;
use drishti_enrolment_models::{DerivedRecord, LocationKey};

use crate::stats::{max, mean, median, or_zero, quantile};

#[derive(Default)]
struct Accumulator {
    velocities: Vec<f64>,
    volumes: Vec<f64>,
    pressures: Vec<f64>,
    child_ratios: Vec<f64>,
    weekend_days: usize,
    bio_sum: f64,
}

impl Accumulator {
    fn push(&mut self, record: &DerivedRecord) {
        self.velocities.push(record.enrol_velocity);
        self.volumes.push(record.total_enrolment);
        self.pressures.push(record.elderly_pressure);
        self.child_ratios.push(record.child_ratio);
        self.weekend_days += usize::from(record.is_weekend);
        self.bio_sum += record.total_bio_updates;
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(self, key: LocationKey) -> LocationProfile {
        let observations = self.volumes.len();
        let volume_sum: f64 = self.volumes.iter().sum();
        let weekend_activity = if observations == 0 {
            0.0
        } else {
            self.weekend_days as f64 / observations as f64
        };

        LocationProfile {
            key,
            observations,
            velocity_q3: or_zero(quantile(&self.velocities, 0.75)),
            max_velocity: or_zero(max(&self.velocities)),
            volume_sum,
            volume_median: or_zero(median(&self.volumes)),
            elderly_pressure_median: or_zero(median(&self.pressures)),
            child_ratio_mean: or_zero(mean(&self.child_ratios)),
            weekend_activity,
            bio_sum: self.bio_sum,
            bio_compliance_rate: self.bio_sum / (volume_sum + 1.0),
        }
    }
}

/// Groups `records` by location and reduces each group to a profile.
///
/// Output is sorted by [`LocationKey`] and contains exactly the keys
/// present in the input.
pub fn aggregate<'a, I>(records: I) -> Vec<LocationProfile>
where
    I: IntoIterator<Item = &'a DerivedRecord>,
{
    let mut groups: BTreeMap<&'a LocationKey, Accumulator> = BTreeMap::new();
    for record in records {
        groups.entry(record.key()).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(key, acc)| acc.finish(key.clone()))
        .collect()
}
