//! Features table export.
//!
//! Writes the derived per-record table back out as CSV. The renamed raw
//! count columns are kept, so the exported file satisfies the column
//! contract and can be fed straight back into the pipeline.

use std::io::Write;
use std::path::Path;

use drishti_enrolment_models::DerivedRecord;
use serde::Serialize;

use crate::FeatureError;

/// One exported row of the features table.
#[derive(Debug, Serialize)]
struct FeatureRow<'a> {
    date: String,
    state: &'a str,
    district: &'a str,
    pincode: &'a str,
    age_0_5: f64,
    age_5_17: f64,
    age_18_plus: f64,
    demo_young: f64,
    demo_old: f64,
    bio_young: f64,
    bio_old: f64,
    total_enrolment: f64,
    total_bio_updates: f64,
    child_ratio: f64,
    elderly_pressure: f64,
    enrol_velocity: f64,
    month: u32,
    is_weekend: u8,
}

impl<'a> From<&'a DerivedRecord> for FeatureRow<'a> {
    fn from(d: &'a DerivedRecord) -> Self {
        let r = &d.record;
        Self {
            date: r.date.format("%Y-%m-%d").to_string(),
            state: &r.key.state,
            district: &r.key.district,
            pincode: &r.key.pincode,
            age_0_5: r.age_0_5,
            age_5_17: r.age_5_17,
            age_18_plus: r.age_18_plus,
            demo_young: r.demo_young,
            demo_old: r.demo_old,
            bio_young: r.bio_young,
            bio_old: r.bio_old,
            total_enrolment: d.total_enrolment,
            total_bio_updates: d.total_bio_updates,
            child_ratio: d.child_ratio,
            elderly_pressure: d.elderly_pressure,
            enrol_velocity: d.enrol_velocity,
            month: d.month,
            is_weekend: u8::from(d.is_weekend),
        }
    }
}

/// Writes the features table to `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`FeatureError`] if the file cannot be created or written.
pub fn write_features_csv(path: &Path, records: &[DerivedRecord]) -> Result<(), FeatureError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_features(file, records)?;
    log::info!("Wrote {} feature rows to {}", records.len(), path.display());
    Ok(())
}

/// Writes the features table to any writer.
///
/// # Errors
///
/// Returns [`FeatureError::Csv`] if serialization fails.
pub fn write_features<W: Write>(writer: W, records: &[DerivedRecord]) -> Result<(), FeatureError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(FeatureRow::from(record))?;
    }
    wtr.flush()?;
    Ok(())
}
