#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Unsupervised outlier detection over numeric feature matrices.
//!
//! [`detect_outliers`] standardizes the matrix with [`StandardScaler`],
//! fits a seeded [`IsolationForest`] on the result, and reports a binary
//! flag plus a continuous severity for every row. The model is rebuilt on
//! every call; nothing is persisted.

pub mod forest;
pub mod scaler;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use forest::{ForestParams, IsolationForest};
pub use scaler::StandardScaler;

/// Errors that can occur while fitting or applying a model.
#[derive(Debug, Error)]
pub enum AnomalyError {
    /// The feature matrix has no rows.
    #[error("Feature matrix is empty")]
    EmptyInput,

    /// A row's width differs from the first row's.
    #[error("Row {row} has {actual} features, expected {expected}")]
    RaggedRow {
        /// Zero-based row index.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        actual: usize,
    },

    /// A hyperparameter is out of range.
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Model verdict for one row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// Whether the row falls in the contamination tail.
    pub is_anomaly: bool,
    /// Decision score. Negative for anomalies; lower is more severe.
    pub severity: f64,
}

/// Scales `rows` and scores them with a freshly fitted isolation forest.
///
/// Returns one [`Outcome`] per input row, in input order. An empty matrix
/// yields no outcomes.
///
/// # Errors
///
/// Returns [`AnomalyError`] for ragged rows or invalid parameters.
pub fn detect_outliers(
    rows: &[Vec<f64>],
    params: &ForestParams,
) -> Result<Vec<Outcome>, AnomalyError> {
    params.validate()?;
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let (scaler, scaled) = StandardScaler::fit_transform(rows)?;
    log::trace!(
        "Scaler means {:?}, scales {:?}",
        scaler.means(),
        scaler.scales()
    );
    let forest = IsolationForest::fit(&scaled, params)?;

    let outcomes: Vec<Outcome> = forest
        .decision_function(&scaled)
        .into_iter()
        .map(|severity| Outcome {
            is_anomaly: severity < 0.0,
            severity,
        })
        .collect();

    log::debug!(
        "Isolation forest flagged {}/{} rows",
        outcomes.iter().filter(|o| o.is_anomaly).count(),
        outcomes.len()
    );

    Ok(outcomes)
}

/// Returns the common row width, validating that the matrix is rectangular
/// and non-empty.
fn matrix_width(rows: &[Vec<f64>]) -> Result<usize, AnomalyError> {
    let first = rows.first().ok_or(AnomalyError::EmptyInput)?;
    let width = first.len();
    for (idx, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(AnomalyError::RaggedRow {
                row: idx,
                expected: width,
                actual: row.len(),
            });
        }
    }
    Ok(width)
}
