//! Order statistics over `f64` samples.
//!
//! Quantiles interpolate linearly between the two closest ranks, matching
//! the common dataframe default. Functions return NaN for an empty sample;
//! callers fill with [`or_zero`].

/// Linear-interpolation quantile, `q` in `[0, 1]`. NaN if `values` is
/// empty.
#[must_use]
pub fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile_sorted(&sorted, q)
}

/// [`quantile`] over an already ascending sample.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    (sorted[hi] - sorted[lo]).mul_add(pos - lo as f64, sorted[lo])
}

/// Median. NaN if `values` is empty.
#[must_use]
pub fn median(values: &[f64]) -> f64 {
    quantile(values, 0.5)
}

/// Arithmetic mean. NaN if `values` is empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Maximum. NaN if `values` is empty.
#[must_use]
pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(f64::NAN)
}

/// Replaces NaN with `0.0`.
#[must_use]
pub const fn or_zero(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value }
}
