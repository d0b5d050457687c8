//! Holt's linear exponential smoothing

use crate::error::{ForecastError, Result};
use crate::models::{
    bounded_point, FitRequest, FittedOracle, ForecastOracle, PredictedPoint, PredictionTarget,
};
use chrono::NaiveDate;
use demand_math::{sample_std_dev, two_sided_z};

/// Level and trend smoothing model; ignores events and covariates
#[derive(Debug, Clone)]
pub struct HoltLinear {
    /// Name of the model
    name: String,
    /// Level smoothing parameter
    alpha: f64,
    /// Trend smoothing parameter
    beta: f64,
}

/// Fitted Holt model
#[derive(Debug, Clone)]
pub struct FittedHoltLinear {
    level: f64,
    trend: f64,
    last_date: NaiveDate,
    /// Standard deviation of one-step-ahead errors
    sigma: f64,
    z: f64,
}

impl Default for HoltLinear {
    fn default() -> Self {
        Self {
            name: "Holt Linear (alpha=0.3, beta=0.05)".to_string(),
            alpha: 0.3,
            beta: 0.05,
        }
    }
}

impl HoltLinear {
    /// Create a new Holt model
    pub fn new(alpha: f64, beta: f64) -> Result<Self> {
        if alpha <= 0.0 || alpha >= 1.0 {
            return Err(ForecastError::InvalidParameter(
                "Alpha must be between 0 and 1".to_string(),
            ));
        }
        if beta <= 0.0 || beta >= 1.0 {
            return Err(ForecastError::InvalidParameter(
                "Beta must be between 0 and 1".to_string(),
            ));
        }

        Ok(Self {
            name: format!("Holt Linear (alpha={}, beta={})", alpha, beta),
            alpha,
            beta,
        })
    }
}

impl ForecastOracle for HoltLinear {
    type Fitted = FittedHoltLinear;

    fn fit(&self, request: &FitRequest<'_>) -> Result<Self::Fitted> {
        request.require_observations(2)?;
        let values: Vec<f64> = request.observations.iter().map(|o| o.value).collect();

        // Initialize from the first two observations
        let mut level = values[0];
        let mut trend = values[1] - values[0];
        let mut errors = Vec::with_capacity(values.len());

        for &value in &values[1..] {
            let predicted = level + trend;
            errors.push(value - predicted);

            let previous_level = level;
            level = self.alpha * value + (1.0 - self.alpha) * (level + trend);
            trend = self.beta * (level - previous_level) + (1.0 - self.beta) * trend;
        }

        let sigma = if errors.len() >= 2 {
            sample_std_dev(&errors)?
        } else {
            0.0
        };

        Ok(FittedHoltLinear {
            level,
            trend,
            last_date: request.observations[request.observations.len() - 1].date,
            sigma,
            z: two_sided_z(request.interval_width)?,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl FittedOracle for FittedHoltLinear {
    fn predict(&self, targets: &[PredictionTarget]) -> Result<Vec<PredictedPoint>> {
        Ok(targets
            .iter()
            .map(|t| {
                let steps = (t.date - self.last_date).num_days().max(1) as f64;
                let point = self.level + steps * self.trend;
                bounded_point(t.date, point, self.z * self.sigma * steps.sqrt())
            })
            .collect())
    }
}
