//! Time-window slicing.
//!
//! The reference date is the latest observation in the full table and is
//! fixed once per run. Every horizon slices relative to that same date, so
//! a sparse recent period shrinks the short horizons instead of shifting
//! them.

use chrono::{Duration, NaiveDate};
use drishti_enrolment_models::DerivedRecord;

/// Latest observation date in `records`, or `None` for an empty table.
#[must_use]
pub fn reference_date(records: &[DerivedRecord]) -> Option<NaiveDate> {
    records.iter().map(DerivedRecord::date).max()
}

/// First date included in a `window_days` window ending at `reference`.
#[must_use]
pub fn window_start(reference: NaiveDate, window_days: u32) -> NaiveDate {
    reference - Duration::days(i64::from(window_days))
}

/// Records dated on or after `reference - window_days`, in input order.
#[must_use]
pub fn slice_window(
    records: &[DerivedRecord],
    reference: NaiveDate,
    window_days: u32,
) -> Vec<&DerivedRecord> {
    let start = window_start(reference, window_days);
    records.iter().filter(|r| r.date() >= start).collect()
}
