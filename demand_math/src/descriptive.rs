//! Descriptive statistics over demand observations
//!
//! All functions reject empty input instead of returning NaN so callers
//! can decide how to treat a missing statistic.

use crate::{MathError, Result};

/// Arithmetic mean of the values
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot compute the mean of an empty slice".to_string(),
        ));
    }

    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator)
///
/// Requires at least two values.
pub fn sample_std_dev(values: &[f64]) -> Result<f64> {
    if values.len() < 2 {
        return Err(MathError::InsufficientData(format!(
            "Sample standard deviation needs at least 2 values, got {}",
            values.len()
        )));
    }

    let mean = mean(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        / (values.len() - 1) as f64;

    Ok(variance.sqrt())
}

/// Median of the values
pub fn median(values: &[f64]) -> Result<f64> {
    percentile(values, 0.5)
}

/// Quantile `q` (in `[0, 1]`) using linear interpolation between closest ranks.
///
/// For `n` sorted values the quantile sits at position `q * (n - 1)`; fractional
/// positions interpolate between the two neighbouring values.
pub fn percentile(values: &[f64], q: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&q) {
        return Err(MathError::InvalidInput(format!(
            "Quantile must be within [0, 1], got {}",
            q
        )));
    }
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot compute a percentile of an empty slice".to_string(),
        ));
    }
    if values.iter().any(|v| v.is_nan()) {
        return Err(MathError::InvalidInput(
            "Percentile input contains NaN".to_string(),
        ));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;

    Ok(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}
