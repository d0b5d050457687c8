//! Ordinary least squares line fitting

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Intercept and slope of a fitted line `y = intercept + slope * x`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineFit {
    pub intercept: f64,
    pub slope: f64,
}

impl LineFit {
    /// Evaluate the line at `x`
    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fit a least squares line through the `(x, y)` pairs.
///
/// When every `x` is (numerically) identical the slope is undefined; the fit
/// then degrades to a flat line through the mean of `y`.
pub fn linear_fit(xs: &[f64], ys: &[f64]) -> Result<LineFit> {
    if xs.len() != ys.len() {
        return Err(MathError::InvalidInput(format!(
            "x and y lengths differ ({} vs {})",
            xs.len(),
            ys.len()
        )));
    }
    if xs.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot fit a line through zero points".to_string(),
        ));
    }

    let n = xs.len() as f64;
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = ys.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (&x, &y) in xs.iter().zip(ys.iter()) {
        numerator += (x - x_mean) * (y - y_mean);
        denominator += (x - x_mean) * (x - x_mean);
    }

    if denominator.abs() < 1e-10 {
        return Ok(LineFit {
            intercept: y_mean,
            slope: 0.0,
        });
    }

    let slope = numerator / denominator;
    let intercept = y_mean - slope * x_mean;
    if !slope.is_finite() || !intercept.is_finite() {
        return Err(MathError::CalculationError(
            "Line fit produced non-finite coefficients".to_string(),
        ));
    }

    Ok(LineFit { intercept, slope })
}
