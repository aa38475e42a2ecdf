//! Linear rescaling of value estimates onto a fixed interval.

use bandit_core::{BanditError, BanditResult};

/// Map `values` linearly so the minimum becomes `lower` and the maximum
/// becomes `upper`. Fails with [`BanditError::DegenerateNormalization`] when
/// every value is equal.
pub fn try_normalize(values: &[f64], lower: f64, upper: f64) -> BanditResult<Vec<f64>> {
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if range == 0.0 || !range.is_finite() {
        return Err(BanditError::DegenerateNormalization { lower, upper });
    }

    Ok(values
        .iter()
        .map(|x| (upper - lower) * ((x - min) / range) + lower)
        .collect())
}

/// Like [`try_normalize`], but a zero range maps every element to the
/// midpoint of `[lower, upper]`.
pub fn normalize(values: &[f64], lower: f64, upper: f64) -> Vec<f64> {
    match try_normalize(values, lower, upper) {
        Ok(normalized) => normalized,
        Err(_) => {
            let midpoint = (lower + upper) / 2.0;
            vec![midpoint; values.len()]
        }
    }
}
