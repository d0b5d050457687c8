//! Per-series pipeline: preprocess, backtest, refit, assemble

use crate::backtest::{evaluate_holdout, production_forecast, split_holdout};
use crate::calendar::EventCalendar;
use crate::config::RunConfig;
use crate::data::{ForecastPoint, RawSeries, RunId};
use crate::metrics::SeriesMetrics;
use crate::models::ForecastOracle;
use crate::preprocess::preprocess;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Forecast and holdout metrics of one successful series
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesForecast {
    pub key: String,
    /// Actual rows first, then forecast rows
    pub points: Vec<ForecastPoint>,
    pub metrics: SeriesMetrics,
}

impl SeriesForecast {
    /// Forecast rows only, in date order
    pub fn forecast_points(&self) -> impl Iterator<Item = &ForecastPoint> {
        self.points.iter().filter(|p| p.is_forecast())
    }
}

/// Why a series produced no output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    Preprocessing(String),
    InsufficientHoldout { got: usize, needed: usize },
    Oracle(String),
    Panicked(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preprocessing(msg) => write!(f, "preprocessing failed: {}", msg),
            Self::InsufficientHoldout { got, needed } => write!(
                f,
                "insufficient test data: {} holdout rows, need {}",
                got, needed
            ),
            Self::Oracle(msg) => write!(f, "oracle failed: {}", msg),
            Self::Panicked(msg) => write!(f, "panicked: {}", msg),
        }
    }
}

/// A series that failed, with its reason
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesFailure {
    pub key: String,
    pub reason: FailureReason,
}

impl fmt::Display for SeriesFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.reason)
    }
}

/// Tagged result of processing one series
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesOutcome {
    Success(SeriesForecast),
    Failure(SeriesFailure),
}

impl SeriesOutcome {
    pub fn key(&self) -> &str {
        match self {
            Self::Success(s) => &s.key,
            Self::Failure(f) => &f.key,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    fn failure(key: &str, reason: FailureReason) -> Self {
        Self::Failure(SeriesFailure {
            key: key.to_string(),
            reason,
        })
    }
}

/// Run the full per-series pipeline for one raw series.
///
/// Errors are converted into [`SeriesOutcome::Failure`]; nothing is returned
/// as `Err`.
pub fn forecast_series<O: ForecastOracle>(
    raw: &RawSeries,
    oracle: &O,
    calendar: &EventCalendar,
    config: &RunConfig,
    run_id: &RunId,
) -> SeriesOutcome {
    let key = raw.key.as_str();

    let cleaned = match preprocess(raw, &config.preprocess) {
        Ok(p) => p.series,
        Err(e) => return SeriesOutcome::failure(key, FailureReason::Preprocessing(e.to_string())),
    };

    let split = split_holdout(&cleaned, config.backtest.holdout_days);
    if split.holdout.len() < config.backtest.min_holdout_points {
        return SeriesOutcome::failure(
            key,
            FailureReason::InsufficientHoldout {
                got: split.holdout.len(),
                needed: config.backtest.min_holdout_points,
            },
        );
    }

    let use_covariate = cleaned.covariate_is_informative();
    let metrics = match evaluate_holdout(
        oracle,
        &split,
        calendar,
        use_covariate,
        &config.backtest,
        key,
        run_id,
    ) {
        Ok(m) => m,
        Err(e) => return SeriesOutcome::failure(key, FailureReason::Oracle(e.to_string())),
    };

    let points = match production_forecast(
        oracle,
        &cleaned,
        calendar,
        use_covariate,
        &config.backtest,
        run_id,
    ) {
        Ok(p) => p,
        Err(e) => return SeriesOutcome::failure(key, FailureReason::Oracle(e.to_string())),
    };

    debug!(
        key,
        oracle = oracle.name(),
        use_covariate,
        mape = metrics.mean_absolute_percentage_error,
        "series forecast complete"
    );

    SeriesOutcome::Success(SeriesForecast {
        key: key.to_string(),
        points,
        metrics,
    })
}
