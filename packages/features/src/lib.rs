#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Master table loading and per-record feature derivation.
//!
//! [`read_master`] enforces the column contract from [`columns`] and turns
//! each CSV row into an [`EnrolmentRecord`]. [`derive_features`] then orders
//! the records by location and date and computes the per-record metrics
//! (totals, ratios, velocity) that every horizon aggregates.

pub mod columns;
pub mod export;
pub mod parsing;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::Datelike as _;
use drishti_enrolment_models::{DerivedRecord, EnrolmentRecord, LocationKey};
use thiserror::Error;

use crate::columns::{COUNT_COLUMNS, ColumnLayout, CountColumn};
use crate::parsing::{parse_count, parse_date};

/// Errors that can occur while loading or exporting the enrolment table.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// File could not be opened or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV framing or serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Required columns are absent after renaming.
    #[error("Missing required columns {missing:?} (found: {found:?})")]
    MissingColumns {
        /// Required columns that were not found.
        missing: Vec<String>,
        /// Normalized names of every column that was present.
        found: Vec<String>,
    },

    /// A count cell held something other than a number.
    #[error("Invalid number '{value}' in column '{column}' on line {line}")]
    InvalidNumber {
        /// 1-based line number, counting the header as line 1.
        line: u64,
        /// Normalized column name.
        column: String,
        /// The offending cell text.
        value: String,
    },

    /// The table had no row with a usable date.
    #[error("Input contains no usable records")]
    EmptyInput,
}

/// Loads the master enrolment CSV at `path`.
///
/// # Errors
///
/// Returns [`FeatureError`] if the file cannot be read, a required column is
/// missing, a count is not numeric, or no row survives date parsing.
pub fn load_master_csv(path: &Path) -> Result<Vec<EnrolmentRecord>, FeatureError> {
    log::info!("Loading master table from {}", path.display());
    let file = File::open(path)?;
    read_master(file)
}

/// Parses a master enrolment table from any reader.
///
/// Rows whose date cannot be parsed are dropped with a warning; missing
/// counts are read as zero.
///
/// # Errors
///
/// See [`load_master_csv`].
pub fn read_master<R: Read>(reader: R) -> Result<Vec<EnrolmentRecord>, FeatureError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let layout = ColumnLayout::resolve(headers.iter())?;
    log::debug!("Resolved column layout: {layout:?}");

    let mut records = Vec::new();
    let mut dropped = 0u64;

    for row in rdr.records() {
        let row = row?;
        let line = row.position().map_or(0, csv::Position::line);
        let cell = |i: usize| row.get(i).unwrap_or_default();

        let Some(date) = parse_date(cell(layout.date)) else {
            dropped += 1;
            log::debug!("Dropping line {line}: unparseable date '{}'", cell(layout.date));
            continue;
        };

        let mut counts = [0.0f64; 7];
        for (value, (field, name)) in counts
            .iter_mut()
            .zip(layout.counts.iter().zip(COUNT_COLUMNS))
        {
            *value = parse_count(cell(*field), line, name)?;
        }

        records.push(EnrolmentRecord {
            date,
            key: LocationKey::new(cell(layout.state), cell(layout.district), cell(layout.pincode)),
            age_0_5: counts[CountColumn::Age0To5 as usize],
            age_5_17: counts[CountColumn::Age5To17 as usize],
            age_18_plus: counts[CountColumn::Age18Plus as usize],
            demo_young: counts[CountColumn::DemoYoung as usize],
            demo_old: counts[CountColumn::DemoOld as usize],
            bio_young: counts[CountColumn::BioYoung as usize],
            bio_old: counts[CountColumn::BioOld as usize],
        });
    }

    if dropped > 0 {
        log::warn!("Dropped {dropped} rows with unparseable dates");
    }

    if records.is_empty() {
        return Err(FeatureError::EmptyInput);
    }

    log::info!("Loaded {} records", records.len());
    Ok(records)
}

/// Computes per-record metrics for the whole table.
///
/// The output is sorted by `(location, date)`, which velocity depends on.
/// Records are not deduplicated; two rows for the same date and location
/// produce two derived records.
#[must_use]
pub fn derive_features(mut records: Vec<EnrolmentRecord>) -> Vec<DerivedRecord> {
    records.sort_by(|a, b| a.key.cmp(&b.key).then(a.date.cmp(&b.date)));

    let mut derived: Vec<DerivedRecord> = Vec::with_capacity(records.len());
    for record in records {
        let previous_total = derived
            .last()
            .filter(|prev| prev.record.key == record.key)
            .map(|prev| prev.total_enrolment);
        derived.push(derive_record(record, previous_total));
    }

    log::info!(
        "Derived features for {} records across {} locations",
        derived.len(),
        count_locations(&derived)
    );
    derived
}

fn derive_record(record: EnrolmentRecord, previous_total: Option<f64>) -> DerivedRecord {
    let total_enrolment = record.age_0_5 + record.age_5_17 + record.age_18_plus;
    let total_bio_updates = record.bio_young + record.bio_old;
    let child_ratio = record.age_0_5 / (total_enrolment + 1.0);
    let elderly_pressure = record.demo_old / (record.demo_young + 1.0);
    let enrol_velocity = previous_total.map_or(0.0, |prev| total_enrolment - prev);
    let is_weekend = record.date.weekday().number_from_monday() >= 6;
    let month = record.date.month();

    DerivedRecord {
        record,
        total_enrolment,
        total_bio_updates,
        child_ratio,
        elderly_pressure,
        enrol_velocity,
        is_weekend,
        month,
    }
}

fn count_locations(sorted: &[DerivedRecord]) -> usize {
    sorted
        .windows(2)
        .filter(|pair| pair[0].record.key != pair[1].record.key)
        .count()
        + usize::from(!sorted.is_empty())
}
