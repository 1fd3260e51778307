//! Zero-mean, unit-variance feature scaling.
//!
//! Isolation scoring picks split points uniformly between a feature's min
//! and max, so a feature measured in hundreds would dominate one measured
//! in fractions. Each column is centred on its mean and divided by its
//! population standard deviation.

use serde::{Deserialize, Serialize};

use crate::AnomalyError;

/// Columns whose standard deviation is below this are left unscaled.
const MIN_SCALE: f64 = 10.0 * f64::EPSILON;

/// Per-column mean and scale learned from a training matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Learns column means and standard deviations (`ddof = 0`).
    ///
    /// A constant column gets a scale of `1.0`, so it transforms to zeros
    /// instead of dividing by zero.
    ///
    /// # Errors
    ///
    /// Returns [`AnomalyError::EmptyInput`] for an empty matrix and
    /// [`AnomalyError::RaggedRow`] if rows differ in length.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, AnomalyError> {
        let width = crate::matrix_width(rows)?;
        #[allow(clippy::cast_precision_loss)]
        let n = rows.len() as f64;

        let mut means = vec![0.0; width];
        for row in rows {
            for (mean, value) in means.iter_mut().zip(row) {
                *mean += value;
            }
        }
        for mean in &mut means {
            *mean /= n;
        }

        let mut scales = vec![0.0; width];
        for row in rows {
            for ((var, value), mean) in scales.iter_mut().zip(row).zip(&means) {
                *var += (value - mean).powi(2);
            }
        }
        for scale in &mut scales {
            let std = (*scale / n).sqrt();
            *scale = if std < MIN_SCALE { 1.0 } else { std };
        }

        Ok(Self { means, scales })
    }

    /// Applies the learned scaling to `rows`.
    ///
    /// # Errors
    ///
    /// Returns [`AnomalyError::RaggedRow`] if a row's width differs from
    /// the training width.
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, AnomalyError> {
        rows.iter()
            .enumerate()
            .map(|(idx, row)| {
                if row.len() != self.means.len() {
                    return Err(AnomalyError::RaggedRow {
                        row: idx,
                        expected: self.means.len(),
                        actual: row.len(),
                    });
                }
                Ok(row
                    .iter()
                    .zip(self.means.iter().zip(&self.scales))
                    .map(|(value, (mean, scale))| (value - mean) / scale)
                    .collect())
            })
            .collect()
    }

    /// Fits on `rows` and returns them scaled.
    ///
    /// # Errors
    ///
    /// See [`Self::fit`].
    pub fn fit_transform(rows: &[Vec<f64>]) -> Result<(Self, Vec<Vec<f64>>), AnomalyError> {
        let scaler = Self::fit(rows)?;
        let scaled = scaler.transform(rows)?;
        Ok((scaler, scaled))
    }

    /// Learned column means.
    #[must_use]
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Learned column scales.
    #[must_use]
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }
}
