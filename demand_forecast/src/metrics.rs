//! Metrics for evaluating forecast performance

use crate::data::RunId;
use crate::error::{ForecastError, Result};
use demand_math::median;
use serde::{Deserialize, Serialize};
use std::fmt;

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(ForecastError::ValidationError(format!(
            "Actual ({}) and predicted ({}) values must have the same non-zero length",
            actual.len(),
            predicted.len()
        )));
    }
    Ok(())
}

/// Mean absolute error
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let sum: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).abs()).sum();
    Ok(sum / actual.len() as f64)
}

/// Root mean squared error
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let sum: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2)).sum();
    Ok((sum / actual.len() as f64).sqrt())
}

/// Mean absolute percentage error, in percent.
///
/// An actual of exactly zero is replaced by one in the denominator.
pub fn mean_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(&a, &p)| {
            let denominator = if a == 0.0 { 1.0 } else { a.abs() };
            (a - p).abs() / denominator
        })
        .sum();
    Ok(sum / actual.len() as f64 * 100.0)
}

/// Mean of `predicted - actual`; positive means over-forecasting
pub fn bias(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let sum: f64 = actual.iter().zip(predicted).map(|(a, p)| p - a).sum();
    Ok(sum / actual.len() as f64)
}

/// Percentage of actuals inside their `[lower, upper]` interval, bounds inclusive
pub fn interval_coverage(actual: &[f64], lower: &[f64], upper: &[f64]) -> Result<f64> {
    check_lengths(actual, lower)?;
    check_lengths(actual, upper)?;
    let covered = actual
        .iter()
        .zip(lower.iter().zip(upper))
        .filter(|(a, (l, u))| *a >= *l && *a <= *u)
        .count();
    Ok(covered as f64 / actual.len() as f64 * 100.0)
}

/// Holdout accuracy of one series in one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesMetrics {
    pub series_key: String,
    pub run_id: RunId,
    pub training_count: usize,
    pub holdout_count: usize,
    pub mean_absolute_error: f64,
    pub root_mean_squared_error: f64,
    pub mean_absolute_percentage_error: f64,
    pub bias: f64,
    pub interval_coverage_pct: f64,
}

impl SeriesMetrics {
    /// Score holdout predictions against actuals
    pub fn evaluate(
        series_key: &str,
        run_id: &RunId,
        training_count: usize,
        actual: &[f64],
        predicted: &[f64],
        lower: &[f64],
        upper: &[f64],
    ) -> Result<Self> {
        Ok(Self {
            series_key: series_key.to_string(),
            run_id: run_id.clone(),
            training_count,
            holdout_count: actual.len(),
            mean_absolute_error: mean_absolute_error(actual, predicted)?,
            root_mean_squared_error: root_mean_squared_error(actual, predicted)?,
            mean_absolute_percentage_error: mean_absolute_percentage_error(actual, predicted)?,
            bias: bias(actual, predicted)?,
            interval_coverage_pct: interval_coverage(actual, lower, upper)?,
        })
    }
}

/// Qualitative grade of a run's median MAPE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityTier {
    Excellent,
    Good,
    Acceptable,
    NeedsImprovement,
}

impl QualityTier {
    pub fn from_median_mape(mape: f64) -> Self {
        if mape < 10.0 {
            Self::Excellent
        } else if mape < 15.0 {
            Self::Good
        } else if mape < 20.0 {
            Self::Acceptable
        } else {
            Self::NeedsImprovement
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Excellent => "EXCELLENT",
            Self::Good => "GOOD",
            Self::Acceptable => "ACCEPTABLE",
            Self::NeedsImprovement => "NEEDS IMPROVEMENT",
        };
        f.write_str(label)
    }
}

/// Run-level summary over successful series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub eligible: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// First failure reasons, as `key: reason`
    pub sample_failures: Vec<String>,
    pub median_mape: Option<f64>,
    pub median_mae: Option<f64>,
    pub median_coverage_pct: Option<f64>,
    pub quality: Option<QualityTier>,
}

impl BatchSummary {
    pub fn new(eligible: usize, failures: Vec<String>, metrics: &[SeriesMetrics]) -> Self {
        let column = |f: fn(&SeriesMetrics) -> f64| {
            let values: Vec<f64> = metrics.iter().map(f).collect();
            median(&values).ok()
        };
        let median_mape = column(|m| m.mean_absolute_percentage_error);

        Self {
            eligible,
            succeeded: metrics.len(),
            failed: failures.len(),
            sample_failures: failures.into_iter().take(5).collect(),
            median_mape,
            median_mae: column(|m| m.mean_absolute_error),
            median_coverage_pct: column(|m| m.interval_coverage_pct),
            quality: median_mape.map(QualityTier::from_median_mape),
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pct = |v: Option<f64>| v.map_or("n/a".to_string(), |v| format!("{:.2}%", v));
        writeln!(f, "Forecast Run Summary:")?;
        writeln!(f, "  Eligible:   {}", self.eligible)?;
        writeln!(f, "  Succeeded:  {}", self.succeeded)?;
        writeln!(f, "  Failed:     {}", self.failed)?;
        writeln!(f, "  Median MAPE:     {}", pct(self.median_mape))?;
        writeln!(
            f,
            "  Median MAE:      {}",
            self.median_mae.map_or("n/a".to_string(), |v| format!("{:.4}", v))
        )?;
        writeln!(f, "  Median Coverage: {}", pct(self.median_coverage_pct))?;
        if let Some(quality) = self.quality {
            writeln!(f, "  Quality:    {}", quality)?;
        }
        for failure in &self.sample_failures {
            writeln!(f, "  Failure: {}", failure)?;
        }
        Ok(())
    }
}
