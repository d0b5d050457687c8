//! Standard normal quantiles for service levels and prediction intervals

use crate::{MathError, Result};
use statrs::distribution::{ContinuousCDF, Normal};

fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0).map_err(|e| MathError::CalculationError(e.to_string()))
}

/// One-sided z-score for a target service level (e.g. 0.90 -> ~1.2816)
pub fn z_for_service_level(service_level: f64) -> Result<f64> {
    if service_level <= 0.0 || service_level >= 1.0 {
        return Err(MathError::InvalidInput(format!(
            "Service level must be strictly between 0 and 1, got {}",
            service_level
        )));
    }

    Ok(standard_normal()?.inverse_cdf(service_level))
}

/// Half-width multiplier of a central prediction interval (0.80 -> ~1.2816)
pub fn two_sided_z(interval_width: f64) -> Result<f64> {
    if interval_width <= 0.0 || interval_width >= 1.0 {
        return Err(MathError::InvalidInput(format!(
            "Interval width must be strictly between 0 and 1, got {}",
            interval_width
        )));
    }

    Ok(standard_normal()?.inverse_cdf((1.0 + interval_width) / 2.0))
}
