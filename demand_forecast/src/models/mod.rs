//! Forecasting oracles
//!
//! An oracle is fit on a slice of cleaned observations plus the run's event
//! calendar, and the fitted handle predicts a point estimate with lower and
//! upper bounds for arbitrary dates. The engine depends only on the
//! [`ForecastOracle`] / [`FittedOracle`] pair, so tests can substitute a
//! deterministic stub for a statistical fit.

use crate::calendar::EventCalendar;
use crate::config::OracleKind;
use crate::data::Observation;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Debug;

pub mod decomposition;
pub mod exponential_smoothing;
pub mod seasonal_naive;

pub use decomposition::{Decomposition, FittedDecomposition};
pub use exponential_smoothing::{FittedHoltLinear, HoltLinear};
pub use seasonal_naive::{FittedSeasonalNaive, SeasonalNaive};

/// Everything an oracle sees when fitting one series
#[derive(Debug, Clone, Copy)]
pub struct FitRequest<'a> {
    /// Cleaned observations, dates strictly increasing
    pub observations: &'a [Observation],
    pub calendar: &'a EventCalendar,
    /// Whether the covariate column should be used as a regressor
    pub use_covariate: bool,
    /// Central prediction interval width, e.g. 0.80
    pub interval_width: f64,
}

impl<'a> FitRequest<'a> {
    /// Reject an empty training slice before any model sees it
    pub fn require_observations(&self, min: usize) -> Result<()> {
        if self.observations.len() < min {
            return Err(ForecastError::OracleError(format!(
                "Need at least {} observations to fit, got {}",
                min,
                self.observations.len()
            )));
        }
        Ok(())
    }
}

/// A date to predict, with the covariate value assumed for that date
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionTarget {
    pub date: NaiveDate,
    pub covariate: Option<f64>,
}

impl PredictionTarget {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            covariate: None,
        }
    }

    pub fn with_covariate(date: NaiveDate, covariate: Option<f64>) -> Self {
        Self { date, covariate }
    }
}

/// Predicted value and interval for one date
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictedPoint {
    pub date: NaiveDate,
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Fitted oracle handle
pub trait FittedOracle: Debug + Send {
    /// Predict every target; the output has one point per target, in order
    fn predict(&self, targets: &[PredictionTarget]) -> Result<Vec<PredictedPoint>>;
}

/// Oracle that can be fit on one series
pub trait ForecastOracle: Debug + Send + Sync {
    /// The fitted handle produced
    type Fitted: FittedOracle;

    /// Fit on the request's observations
    fn fit(&self, request: &FitRequest<'_>) -> Result<Self::Fitted>;

    /// Name of the oracle
    fn name(&self) -> &str;
}

/// Day offset of `date` from `origin`, as a regression input
pub(crate) fn day_index(origin: NaiveDate, date: NaiveDate) -> f64 {
    (date - origin).num_days() as f64
}

/// Reference oracle chosen at run time
#[derive(Debug, Clone)]
pub enum ReferenceOracle {
    Decomposition(Decomposition),
    HoltLinear(HoltLinear),
    SeasonalNaive(SeasonalNaive),
}

/// Fitted handle of a [`ReferenceOracle`]
#[derive(Debug, Clone)]
pub enum FittedReference {
    Decomposition(FittedDecomposition),
    HoltLinear(FittedHoltLinear),
    SeasonalNaive(FittedSeasonalNaive),
}

impl ReferenceOracle {
    /// Oracle with default parameters for the configured kind
    pub fn from_kind(kind: OracleKind) -> Self {
        match kind {
            OracleKind::Decomposition => Self::Decomposition(Decomposition::default()),
            OracleKind::HoltLinear => Self::HoltLinear(HoltLinear::default()),
            OracleKind::SeasonalNaive => Self::SeasonalNaive(SeasonalNaive::default()),
        }
    }
}

impl ForecastOracle for ReferenceOracle {
    type Fitted = FittedReference;

    fn fit(&self, request: &FitRequest<'_>) -> Result<Self::Fitted> {
        Ok(match self {
            Self::Decomposition(o) => FittedReference::Decomposition(o.fit(request)?),
            Self::HoltLinear(o) => FittedReference::HoltLinear(o.fit(request)?),
            Self::SeasonalNaive(o) => FittedReference::SeasonalNaive(o.fit(request)?),
        })
    }

    fn name(&self) -> &str {
        match self {
            Self::Decomposition(o) => o.name(),
            Self::HoltLinear(o) => o.name(),
            Self::SeasonalNaive(o) => o.name(),
        }
    }
}

impl FittedOracle for FittedReference {
    fn predict(&self, targets: &[PredictionTarget]) -> Result<Vec<PredictedPoint>> {
        match self {
            Self::Decomposition(f) => f.predict(targets),
            Self::HoltLinear(f) => f.predict(targets),
            Self::SeasonalNaive(f) => f.predict(targets),
        }
    }
}

/// Point estimate with a symmetric interval, floored at zero demand
pub(crate) fn bounded_point(date: NaiveDate, point: f64, half_width: f64) -> PredictedPoint {
    let point = point.max(0.0);
    PredictedPoint {
        date,
        point,
        lower: (point - half_width).max(0.0),
        upper: point + half_width,
    }
}
