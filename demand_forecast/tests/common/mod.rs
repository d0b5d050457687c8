//! Shared fixtures: deterministic stub oracles and series builders

#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use demand_forecast::data::{RawObservation, RawSeries};
use demand_forecast::error::{ForecastError, Result};
use demand_forecast::models::{
    FitRequest, FittedOracle, ForecastOracle, PredictedPoint, PredictionTarget,
};
use std::f64::consts::PI;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn start() -> NaiveDate {
    date(2022, 1, 1)
}

/// One row per day from `start()` for `days` days
pub fn daily_series(key: &str, days: usize, value: impl Fn(NaiveDate) -> f64) -> RawSeries {
    let rows = (0..days)
        .map(|t| {
            let d = start() + Duration::days(t as i64);
            RawObservation::new(d, value(d))
        })
        .collect();
    RawSeries::new(key, rows)
}

/// Weekly cycle around 50 units per day
pub fn flagship_value(d: NaiveDate) -> f64 {
    let t = (d - start()).num_days() as f64;
    50.0 + 5.0 * (2.0 * PI * t / 7.0).sin()
}

/// Predicts a known function of the date exactly
#[derive(Debug, Clone)]
pub struct ExactOracle {
    pub truth: fn(NaiveDate) -> f64,
    /// Added to every prediction
    pub offset: f64,
    pub half_width: f64,
}

impl ExactOracle {
    pub fn new(truth: fn(NaiveDate) -> f64) -> Self {
        Self {
            truth,
            offset: 0.0,
            half_width: 2.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FittedExact(ExactOracle);

impl ForecastOracle for ExactOracle {
    type Fitted = FittedExact;

    fn fit(&self, request: &FitRequest<'_>) -> Result<Self::Fitted> {
        request.require_observations(1)?;
        Ok(FittedExact(self.clone()))
    }

    fn name(&self) -> &str {
        "exact"
    }
}

impl FittedOracle for FittedExact {
    fn predict(&self, targets: &[PredictionTarget]) -> Result<Vec<PredictedPoint>> {
        Ok(targets
            .iter()
            .map(|t| {
                let point = (self.0.truth)(t.date) + self.0.offset;
                PredictedPoint {
                    date: t.date,
                    point,
                    lower: point - self.0.half_width,
                    upper: point + self.0.half_width,
                }
            })
            .collect())
    }
}

/// Predicts `covariate + 1`, or `1` without a covariate
#[derive(Debug, Clone, Default)]
pub struct CovariateEchoOracle;

#[derive(Debug, Clone)]
pub struct FittedEcho {
    pub saw_covariate: bool,
}

impl ForecastOracle for CovariateEchoOracle {
    type Fitted = FittedEcho;

    fn fit(&self, request: &FitRequest<'_>) -> Result<Self::Fitted> {
        Ok(FittedEcho {
            saw_covariate: request.use_covariate,
        })
    }

    fn name(&self) -> &str {
        "covariate echo"
    }
}

impl FittedOracle for FittedEcho {
    fn predict(&self, targets: &[PredictionTarget]) -> Result<Vec<PredictedPoint>> {
        Ok(targets
            .iter()
            .map(|t| {
                let point = t.covariate.unwrap_or(0.0) + 1.0;
                PredictedPoint {
                    date: t.date,
                    point,
                    lower: point,
                    upper: point,
                }
            })
            .collect())
    }
}

/// Predicts the training mean; errors or panics when the first training
/// value equals a marker. Markers sit below typical values so clipping
/// leaves them intact.
#[derive(Debug, Clone)]
pub struct MarkerOracle {
    pub error_marker: f64,
    pub panic_marker: f64,
}

impl Default for MarkerOracle {
    fn default() -> Self {
        Self {
            error_marker: 4.0,
            panic_marker: 3.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FittedMean(f64);

impl ForecastOracle for MarkerOracle {
    type Fitted = FittedMean;

    fn fit(&self, request: &FitRequest<'_>) -> Result<Self::Fitted> {
        request.require_observations(1)?;
        let first = request.observations[0].value;
        if first == self.error_marker {
            return Err(ForecastError::OracleError("did not converge".to_string()));
        }
        if first == self.panic_marker {
            panic!("numerical blow-up");
        }

        let n = request.observations.len() as f64;
        Ok(FittedMean(
            request.observations.iter().map(|o| o.value).sum::<f64>() / n,
        ))
    }

    fn name(&self) -> &str {
        "marker"
    }
}

impl FittedOracle for FittedMean {
    fn predict(&self, targets: &[PredictionTarget]) -> Result<Vec<PredictedPoint>> {
        Ok(targets
            .iter()
            .map(|t| PredictedPoint {
                date: t.date,
                point: self.0,
                lower: self.0 * 0.5,
                upper: self.0 * 1.5,
            })
            .collect())
    }
}

/// Returns fewer predictions than requested
#[derive(Debug, Clone, Default)]
pub struct ShortOracle;

impl ForecastOracle for ShortOracle {
    type Fitted = ShortOracle;

    fn fit(&self, _request: &FitRequest<'_>) -> Result<Self::Fitted> {
        Ok(ShortOracle)
    }

    fn name(&self) -> &str {
        "short"
    }
}

impl FittedOracle for ShortOracle {
    fn predict(&self, targets: &[PredictionTarget]) -> Result<Vec<PredictedPoint>> {
        Ok(targets
            .iter()
            .skip(1)
            .map(|t| PredictedPoint {
                date: t.date,
                point: 1.0,
                lower: 0.0,
                upper: 2.0,
            })
            .collect())
    }
}
